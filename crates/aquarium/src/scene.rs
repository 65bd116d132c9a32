//! The synthetic tank: scenery, seaweed, fish schools, the globe glass and
//! the environment box, driven by an orbiting camera.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use glam::{Mat4, Vec3};

use aquarium_engine::core::{App, AppControl, FrameCtx};
use aquarium_engine::render::model::{FishInstance, MAX_FISH_INSTANCES, MAX_SEAWEED_INSTANCES};
use aquarium_engine::render::scene::{
    FogUniforms, LightUniforms, LightWorldPositionUniform, ViewUniforms, keys,
};
use aquarium_engine::render::{
    Context, DirShaderLibrary, InstanceUniforms, Model, ModelName, Program, RenderBackend,
    ResourceMap, SceneState, ShaderLibrary,
};

use crate::mesh::{GpuMesh, MeshData};
use crate::shaders;
use crate::textures::TankTextures;

const FISH_SPECIES: [ModelName; 5] = [
    ModelName::SmallFishA,
    ModelName::MediumFishA,
    ModelName::MediumFishB,
    ModelName::BigFishA,
    ModelName::BigFishB,
];

#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub seaweed: u32,
    pub fish: u32,
    /// Directory of `<id>.wgsl` overrides; built-in sources when `None`.
    pub shaders: Option<PathBuf>,
    /// Ends the run after this many frames.
    pub max_frames: Option<u64>,
}

/// Camera derived from the scene clock.
#[derive(Debug, Copy, Clone)]
struct Camera {
    eye: Vec3,
    view_projection: Mat4,
    view_inverse: Mat4,
}

impl Camera {
    fn orbit(clock: f32, aspect: f32) -> Self {
        let angle = clock * 0.05;
        let eye = Vec3::new(angle.sin() * 70.0, 25.0, angle.cos() * 70.0);
        let view = Mat4::look_at_rh(eye, Vec3::new(0.0, 8.0, 0.0), Vec3::Y);
        let projection = Mat4::perspective_rh(60f32.to_radians(), aspect.max(0.01), 1.0, 1000.0);
        Self {
            eye,
            view_projection: projection * view,
            view_inverse: view.inverse(),
        }
    }

    fn object_view(&self, world: Mat4) -> ViewUniforms {
        ViewUniforms {
            world: world.to_cols_array_2d(),
            world_inverse_transpose: world.inverse().transpose().to_cols_array_2d(),
            world_view_projection: (self.view_projection * world).to_cols_array_2d(),
        }
    }

    fn light_world_position(&self) -> LightWorldPositionUniform {
        LightWorldPositionUniform {
            light_world_pos: (self.eye + Vec3::new(0.0, 50.0, 0.0)).to_array(),
            _pad: 0.0,
            view_projection: self.view_projection.to_cols_array_2d(),
            view_inverse: self.view_inverse.to_cols_array_2d(),
        }
    }
}

/// One fish's fixed swim parameters.
#[derive(Debug, Copy, Clone)]
struct Swimmer {
    radius: f32,
    height: f32,
    speed: f32,
    phase: f32,
    scale: f32,
}

impl Swimmer {
    fn new(index: u32, scale: f32) -> Self {
        Self {
            radius: 10.0 + ((index * 7) % 23) as f32,
            height: 2.0 + ((index * 5) % 17) as f32,
            speed: 0.2 + (index % 7) as f32 * 0.03,
            phase: index as f32 * 0.37,
            scale,
        }
    }

    fn position(&self, angle: f32) -> Vec3 {
        Vec3::new(
            angle.cos() * self.radius,
            self.height + (angle * 2.0).sin(),
            angle.sin() * self.radius,
        )
    }

    fn at(&self, clock: f32) -> FishInstance {
        let angle = clock * self.speed + self.phase;
        FishInstance {
            world_position: self.position(angle).to_array(),
            scale: self.scale,
            next_position: self.position(angle + 0.02).to_array(),
            time: clock * 5.0 + self.phase,
        }
    }
}

/// How a model's per-instance data is produced each frame.
#[derive(Debug)]
enum Placement {
    /// Baked in world space; reads only the shared camera.
    Scenery,
    Object(Mat4),
    Blades(Vec<Mat4>),
    School(Vec<Swimmer>),
}

#[derive(Debug)]
struct Placed {
    model: Model,
    placement: Placement,
}

impl Placed {
    fn stage(&mut self, camera: &Camera, clock: f32) -> aquarium_engine::render::Result<()> {
        match &self.placement {
            Placement::Scenery => Ok(()),
            Placement::Object(world) => self.model.update_per_instance_uniforms(
                &InstanceUniforms::View(camera.object_view(*world)),
                clock,
            ),
            Placement::Blades(worlds) => {
                for world in worlds {
                    self.model.update_per_instance_uniforms(
                        &InstanceUniforms::View(camera.object_view(*world)),
                        clock,
                    )?;
                }
                Ok(())
            }
            Placement::School(swimmers) => {
                for swimmer in swimmers {
                    let fish = InstanceUniforms::Fish(swimmer.at(clock));
                    self.model.update_per_instance_uniforms(&fish, clock)?;
                }
                Ok(())
            }
        }
    }
}

struct Programs {
    generic: Program,
    fish: Program,
    seaweed: Program,
    inner: Program,
    outside: Program,
}

impl Programs {
    fn create<B: RenderBackend>(ctx: &mut Context<B>, library: &dyn ShaderLibrary) -> Result<Self> {
        let mut program = |kind: &str| {
            ctx.create_program(library, &format!("{kind}_vs"), &format!("{kind}_fs"))
                .with_context(|| format!("loading {kind} shaders"))
        };
        Ok(Self {
            generic: program("generic_normal")?,
            fish: program("fish")?,
            seaweed: program("seaweed")?,
            inner: program("inner")?,
            outside: program("outside")?,
        })
    }
}

/// Resources that live from `on_start` to `on_exit`.
struct Loaded {
    textures: TankTextures,
    meshes: Vec<GpuMesh>,
    /// In draw order; blended glass last.
    models: Vec<Placed>,
}

pub struct AquariumScene {
    config: SceneConfig,
    scene: SceneState,
    loaded: Option<Loaded>,
    frames: u64,
}

impl AquariumScene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            scene: initial_scene(),
            loaded: None,
            frames: 0,
        }
    }

    /// Loaded models in draw order.
    #[cfg(test)]
    fn model_names(&self) -> Vec<ModelName> {
        self.loaded
            .as_ref()
            .map(|l| l.models.iter().map(|p| p.model.name()).collect())
            .unwrap_or_default()
    }
}

fn initial_scene() -> SceneState {
    SceneState {
        light: LightUniforms {
            light_color: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.25, 0.25, 0.25, 1.0],
        },
        fog: FogUniforms {
            fog_power: 14.5,
            fog_mult: 1.66,
            fog_offset: 0.53,
            _pad: 0.0,
            fog_color: [0.54, 0.86, 1.0, 1.0],
        },
        ..SceneState::default()
    }
}

/// Creates `name` in its usual group and initializes it. An unknown group
/// yields `Ok(None)`; the context has already logged it.
fn build<B: RenderBackend>(
    ctx: &mut Context<B>,
    name: ModelName,
    enable_blend: bool,
    program: &Program,
    resources: &ResourceMap<'_>,
    placement: Placement,
) -> Result<Option<Placed>> {
    let Some(mut model) = ctx.create_model(name.default_group().as_str(), name, enable_blend) else {
        return Ok(None);
    };
    model
        .init(ctx, program, resources)
        .with_context(|| format!("initializing {name}"))?;
    log::debug!("{name} ready as {}", model.group());
    Ok(Some(Placed { model, placement }))
}

fn split(total: u32, parts: u32, part: u32) -> u32 {
    total / parts + u32::from(part < total % parts)
}

impl App for AquariumScene {
    fn on_start<B: RenderBackend>(&mut self, ctx: &mut Context<B>) -> Result<()> {
        let (width, height) = ctx.size();
        let camera = Camera::orbit(0.0, width as f32 / height.max(1) as f32);
        self.scene.light_world_position = camera.light_world_position();
        self.scene.view = camera.object_view(Mat4::IDENTITY);
        ctx.init_general_resources(&self.scene)
            .context("creating general resources")?;

        let library: Box<dyn ShaderLibrary> = match &self.config.shaders {
            Some(dir) => Box::new(DirShaderLibrary::new(dir)),
            None => Box::new(shaders::builtin()),
        };
        let programs = Programs::create(ctx, library.as_ref())?;
        let textures = TankTextures::create(ctx).context("creating textures")?;

        let scenery = [
            (ModelName::FloorCenter, Vec3::new(0.0, -1.0, 0.0), Vec3::new(40.0, 1.0, 40.0)),
            (ModelName::RockA, Vec3::new(-12.0, 3.0, -6.0), Vec3::new(3.0, 3.0, 2.5)),
            (ModelName::RockB, Vec3::new(14.0, 1.5, 8.0), Vec3::new(2.0, 1.5, 3.0)),
            (ModelName::RuinColumn, Vec3::new(6.0, 5.0, -14.0), Vec3::new(1.0, 5.0, 1.0)),
            (ModelName::TreasureChest, Vec3::new(-4.0, 1.0, 10.0), Vec3::new(1.5, 1.0, 1.0)),
        ];
        let mut meshes = Vec::new();
        for (name, center, half) in scenery {
            meshes.push(GpuMesh::upload(ctx, name.as_str(), &MeshData::cuboid(center, half))?);
        }
        let environment = GpuMesh::upload(
            ctx,
            "EnvironmentBox",
            &MeshData::cuboid(Vec3::new(0.0, 20.0, 0.0), Vec3::new(150.0, 80.0, 150.0)),
        )?;
        let globe = GpuMesh::upload(ctx, "GlobeInner", &MeshData::sphere(1.0, 24, 32))?;
        let tall_blade = GpuMesh::upload(ctx, "SeaweedA", &MeshData::blade(12.0, 1.2, 8))?;
        let short_blade = GpuMesh::upload(ctx, "SeaweedB", &MeshData::blade(8.0, 1.6, 6))?;
        let fish = GpuMesh::upload(ctx, "fish", &MeshData::fish(10.0))?;

        let mut models = Vec::new();

        let outside = environment
            .basic()
            .with_texture(keys::DIFFUSE, &textures.backdrop);
        models.extend(build(
            ctx,
            ModelName::EnvironmentBox,
            false,
            &programs.outside,
            &outside,
            Placement::Object(Mat4::IDENTITY),
        )?);

        for ((name, _, _), mesh) in scenery.iter().zip(&meshes) {
            let diffuse = if *name == ModelName::FloorCenter {
                &textures.sand
            } else {
                &textures.rock
            };
            let resources = mesh
                .full()
                .with_texture(keys::DIFFUSE, diffuse)
                .with_texture(keys::NORMAL_MAP, &textures.normal_map);
            models.extend(build(
                ctx,
                *name,
                false,
                &programs.generic,
                &resources,
                Placement::Scenery,
            )?);
        }

        let blades = [
            (ModelName::SeaweedA, &tall_blade),
            (ModelName::SeaweedB, &short_blade),
        ];
        for (part, (name, mesh)) in blades.into_iter().enumerate() {
            let count =
                split(self.config.seaweed, 2, part as u32).min(MAX_SEAWEED_INSTANCES as u32);
            if count == 0 {
                continue;
            }
            let worlds = (0..count)
                .map(|i| {
                    let angle = (i * 2 + part as u32) as f32 * 2.399;
                    let radius = 8.0 + ((i % 5) * 4) as f32;
                    let base = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
                    Mat4::from_translation(base) * Mat4::from_rotation_y(angle)
                })
                .collect();
            let resources = mesh.basic().with_texture(keys::DIFFUSE, &textures.seaweed);
            models.extend(build(
                ctx,
                name,
                false,
                &programs.seaweed,
                &resources,
                Placement::Blades(worlds),
            )?);
        }

        let species = FISH_SPECIES.len() as u32;
        for (part, name) in FISH_SPECIES.into_iter().enumerate() {
            let count =
                split(self.config.fish, species, part as u32).min(MAX_FISH_INSTANCES as u32);
            if count == 0 {
                continue;
            }
            let scale = match name {
                ModelName::SmallFishA => 0.3,
                ModelName::MediumFishA | ModelName::MediumFishB => 0.5,
                _ => 0.8,
            };
            let swimmers = (0..count)
                .map(|i| Swimmer::new(i * species + part as u32, scale))
                .collect();
            let resources = fish
                .full()
                .with_texture(keys::DIFFUSE, &textures.fish)
                .with_texture(keys::NORMAL_MAP, &textures.normal_map);
            models.extend(build(
                ctx,
                name,
                false,
                &programs.fish,
                &resources,
                Placement::School(swimmers),
            )?);
        }

        let glass = globe
            .full()
            .with_texture(keys::DIFFUSE, &textures.glass)
            .with_texture(keys::NORMAL_MAP, &textures.normal_map)
            .with_texture(keys::REFLECTION_MAP, &textures.reflection_map)
            .with_texture(keys::SKYBOX, &textures.skybox);
        let globe_world =
            Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0)) * Mat4::from_scale(Vec3::splat(45.0));
        models.extend(build(
            ctx,
            ModelName::GlobeInner,
            true,
            &programs.inner,
            &glass,
            Placement::Object(globe_world),
        )?);

        meshes.extend([environment, globe, tall_blade, short_blade, fish]);
        log::info!(
            "tank ready: {} models, {} seaweed, {} fish",
            models.len(),
            self.config.seaweed.min(2 * MAX_SEAWEED_INSTANCES as u32),
            self.config.fish,
        );

        self.loaded = Some(Loaded {
            textures,
            meshes,
            models,
        });
        Ok(())
    }

    fn on_frame<B: RenderBackend>(&mut self, frame: &mut FrameCtx<'_, B>) -> AppControl {
        let Some(loaded) = self.loaded.as_mut() else {
            return AppControl::Exit;
        };

        let clock = frame.clock();
        let (width, height) = frame.render.size();
        let camera = Camera::orbit(clock, width as f32 / height.max(1) as f32);

        self.scene.clock = clock;
        self.scene.light_world_position = camera.light_world_position();
        self.scene.view = camera.object_view(Mat4::IDENTITY);
        frame.render.update_world_uniforms(&self.scene);

        // Staging happens inside the frame so a skipped frame stages nothing.
        let control = frame.draw_frame(|ctx, _| {
            for placed in &mut loaded.models {
                let name = placed.model.name();
                if let Err(err) = placed.stage(&camera, clock) {
                    log::warn!("{name}: {err}");
                }
                if let Err(err) = placed.model.draw(ctx) {
                    log::error!("{name}: {err}");
                }
            }
            Ok(())
        });

        self.frames += 1;
        match self.config.max_frames {
            Some(max) if self.frames >= max => AppControl::Exit,
            _ => control,
        }
    }

    fn on_exit<B: RenderBackend>(&mut self, ctx: &mut Context<B>) {
        let Some(loaded) = self.loaded.take() else {
            return;
        };
        for placed in loaded.models {
            placed.model.destroy(ctx);
        }
        for mesh in loaded.meshes {
            mesh.destroy(ctx);
        }
        loaded.textures.destroy(ctx);
        log::info!("tank released after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aquarium_engine::core::run_frames;
    use aquarium_engine::render::HeadlessBackend;
    use aquarium_engine::time::FrameClock;

    use super::*;

    fn config(seaweed: u32, fish: u32) -> SceneConfig {
        SceneConfig {
            seaweed,
            fish,
            ..Default::default()
        }
    }

    #[test]
    fn split_distributes_the_remainder_first() {
        let parts: Vec<u32> = (0..5).map(|p| split(12, 5, p)).collect();
        assert_eq!(parts, vec![3, 3, 2, 2, 2]);
        assert_eq!(parts.iter().sum::<u32>(), 12);
    }

    #[test]
    fn fish_heads_along_their_path() {
        let swimmer = Swimmer::new(3, 0.5);
        let fish = swimmer.at(10.0);
        assert_ne!(fish.world_position, fish.next_position);
        assert_eq!(fish.scale, 0.5);
    }

    #[test]
    fn headless_run_draws_every_model_each_frame() {
        let mut scene = AquariumScene::new(config(6, 12));
        let mut ctx = Context::new(HeadlessBackend::new(320, 240).with_frame_history(4));

        let ran = run_frames(&mut scene, &mut ctx, 3, Duration::from_millis(16)).unwrap();
        assert_eq!(ran, 3);

        // environment, 5 scenery, 2 seaweed, 5 fish species, glass
        let last = ctx.backend().last_frame().unwrap();
        assert_eq!(last.draws.len(), 14);

        let seaweed: u32 = last.draws[6..8].iter().map(|d| d.instance_count).sum();
        let fish: u32 = last.draws[8..13].iter().map(|d| d.instance_count).sum();
        assert_eq!((seaweed, fish), (6, 12));
    }

    #[test]
    fn skipped_frames_do_not_carry_instances_over() {
        let mut scene = AquariumScene::new(config(24, 12));
        let mut ctx = Context::new(HeadlessBackend::new(320, 240));
        ctx.backend_mut().skip_next_frames(2);

        let ran = run_frames(&mut scene, &mut ctx, 4, Duration::from_millis(16)).unwrap();
        assert_eq!(ran, 4);
        assert_eq!(ctx.backend().presented(), 2);

        for frame in ctx.backend().frames() {
            assert_eq!(frame.draws.len(), 14);
            let seaweed: Vec<u32> = frame.draws[6..8].iter().map(|d| d.instance_count).collect();
            assert_eq!(seaweed, vec![12, 12]);
        }
    }

    #[test]
    fn a_failing_model_does_not_stop_the_others() {
        let mut scene = AquariumScene::new(config(6, 12));
        let mut ctx = Context::new(HeadlessBackend::new(320, 240));
        scene.on_start(&mut ctx).unwrap();

        let uninitialized = ctx.create_model("generic", ModelName::Arch, false).unwrap();
        scene.loaded.as_mut().unwrap().models.insert(
            0,
            Placed {
                model: uninitialized,
                placement: Placement::Scenery,
            },
        );

        let time = FrameClock::new().tick_fixed(Duration::from_millis(16));
        let control = scene.on_frame(&mut FrameCtx::new(&mut ctx, time));
        assert_eq!(control, AppControl::Continue);
        assert_eq!(ctx.backend().last_frame().unwrap().draws.len(), 14);
        scene.on_exit(&mut ctx);
    }

    #[test]
    fn empty_batches_are_not_created() {
        let mut scene = AquariumScene::new(config(0, 2));
        let mut ctx = Context::new(HeadlessBackend::new(64, 64));
        scene.on_start(&mut ctx).unwrap();

        let names = scene.model_names();
        assert!(!names.contains(&ModelName::SeaweedA));
        assert!(names.contains(&ModelName::SmallFishA));
        assert!(names.contains(&ModelName::MediumFishA));
        assert!(!names.contains(&ModelName::BigFishB));
        scene.on_exit(&mut ctx);
    }

    #[test]
    fn frame_limit_ends_the_run() {
        let mut scene = AquariumScene::new(SceneConfig {
            max_frames: Some(2),
            ..config(2, 5)
        });
        let mut ctx = Context::new(HeadlessBackend::new(64, 64));
        let ran = run_frames(&mut scene, &mut ctx, 10, Duration::from_millis(16)).unwrap();
        assert_eq!(ran, 2);
    }
}
