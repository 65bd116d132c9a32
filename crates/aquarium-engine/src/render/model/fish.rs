use bytemuck::{Pod, Zeroable};

use crate::render::backend::RenderBackend;
use crate::render::binding::{BindingEntry, BindingSpec};
use crate::render::context::Context;
use crate::render::draw::DrawCall;
use crate::render::error::{RenderError, Result};
use crate::render::program::Program;
use crate::render::resources::Buffer;
use crate::render::scene::{ResourceMap, keys};

use super::common::{self, F, LightFactorUniforms, Mesh, ModelBindings, V};
use super::{InstanceUniforms, ModelName};

const KIND: &str = "fish";

/// Fish a single model can batch into one draw.
pub const MAX_FISH_INSTANCES: usize = 1024;

/// Swim animation shape, fixed per species.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FishVertexUniforms {
    pub fish_length: f32,
    pub fish_wave_length: f32,
    pub fish_bend_amount: f32,
    pub _pad: f32,
}

impl FishVertexUniforms {
    pub fn for_species(name: ModelName) -> Self {
        let (fish_length, fish_wave_length, fish_bend_amount) = match name {
            ModelName::SmallFishA => (10.0, 1.0, 2.0),
            ModelName::MediumFishA | ModelName::MediumFishB => (10.0, -2.0, 2.0),
            ModelName::BigFishA => (10.0, -1.0, 0.5),
            ModelName::BigFishB => (10.0, -0.7, 0.3),
            other => {
                log::warn!("{other} is not a fish species, using small fish animation");
                (10.0, 1.0, 2.0)
            }
        };
        Self {
            fish_length,
            fish_wave_length,
            fish_bend_amount,
            _pad: 0.0,
        }
    }
}

/// One fish: where it is, where it swims to, and its animation phase.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FishInstance {
    pub world_position: [f32; 3],
    pub scale: f32,
    pub next_position: [f32; 3],
    pub time: f32,
}

#[derive(Debug)]
struct Initialized {
    bindings: ModelBindings,
    fish_vertex: Buffer,
    light_factor: Buffer,
    instances: Buffer,
}

/// Instanced fish of one species.
///
/// Pipeline layout `[general, world, model, per-instance]`:
/// - model `{0 fish vertex (V), 1 light factor, 2 sampler, 3 diffuse, 4 normal map}`
/// - per-instance `{0 instance array (V)}`
#[derive(Debug)]
pub struct FishModel {
    name: ModelName,
    enable_blend: bool,
    fish_vertex: FishVertexUniforms,
    light_factor: LightFactorUniforms,
    instances: Vec<FishInstance>,
    state: Option<Initialized>,
}

impl FishModel {
    pub fn new(name: ModelName, enable_blend: bool) -> Self {
        Self {
            name,
            enable_blend,
            fish_vertex: FishVertexUniforms::for_species(name),
            light_factor: LightFactorUniforms::default(),
            instances: Vec::new(),
            state: None,
        }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn bindings(&self) -> Option<&ModelBindings> {
        self.state.as_ref().map(|s| &s.bindings)
    }

    pub fn fish_vertex_uniforms(&self) -> FishVertexUniforms {
        self.fish_vertex
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn init<B: RenderBackend>(
        &mut self,
        ctx: &mut Context<B>,
        program: &Program,
        resources: &ResourceMap<'_>,
    ) -> Result<()> {
        let diffuse = common::texture(resources, KIND, keys::DIFFUSE)?;
        let normal_map = common::texture(resources, KIND, keys::NORMAL_MAP)?;
        let mesh = Mesh::resolve(
            resources,
            KIND,
            &[
                keys::POSITION,
                keys::NORMAL,
                keys::TEX_COORD,
                keys::TANGENT,
                keys::BINORMAL,
            ],
        )?;

        let (general_layout, general_group, world_layout, world_group) = {
            let globals = ctx.globals()?;
            (
                globals.general_layout,
                globals.general_group,
                globals.world_layout,
                globals.world_group,
            )
        };

        let label = format!("{KIND} {}", self.name);

        let model_layout = ctx.make_bind_group_layout(
            &label,
            [
                BindingSpec::uniform(0, V),
                BindingSpec::uniform(1, F),
                BindingSpec::sampler(2, F),
                BindingSpec::texture(3, F),
                BindingSpec::texture(4, F),
            ],
        )?;
        let per_layout = ctx.make_bind_group_layout(
            &format!("{label} per-instance"),
            [BindingSpec::uniform(0, V)],
        )?;

        let fish_vertex =
            ctx.create_uniform_buffer(&format!("{label} vertex"), &self.fish_vertex)?;
        let light_factor = ctx.create_uniform_buffer(&label, &self.light_factor)?;
        let instances = ctx.create_buffer(
            &format!("{label} instances"),
            (MAX_FISH_INSTANCES * size_of::<FishInstance>()) as u64,
            wgpu::BufferUsages::UNIFORM,
        )?;

        let model_group = ctx.make_bind_group(
            &label,
            model_layout,
            &[
                BindingEntry::new(0, fish_vertex.binding()),
                BindingEntry::new(1, light_factor.binding()),
                BindingEntry::new(2, diffuse.sampler_binding()),
                BindingEntry::new(3, diffuse.view_binding()),
                BindingEntry::new(4, normal_map.view_binding()),
            ],
        )?;
        let per_group = ctx.make_bind_group(
            &format!("{label} per-instance"),
            per_layout,
            &[BindingEntry::new(0, instances.binding())],
        )?;

        let bindings = common::finish(
            ctx,
            &label,
            program,
            &mesh,
            &[
                (general_layout, general_group),
                (world_layout, world_group),
                (model_layout, model_group),
                (per_layout, per_group),
            ],
            2,
            self.enable_blend,
        )?;

        self.state = Some(Initialized {
            bindings,
            fish_vertex,
            light_factor,
            instances,
        });
        Ok(())
    }

    pub fn update_per_instance_uniforms(&mut self, uniforms: &InstanceUniforms) -> Result<()> {
        let InstanceUniforms::Fish(fish) = uniforms else {
            return Err(RenderError::UnexpectedInstanceData {
                model: KIND,
                supplied: uniforms.kind(),
            });
        };
        if self.instances.len() >= MAX_FISH_INSTANCES {
            return Err(RenderError::InstanceCapacityExceeded {
                capacity: MAX_FISH_INSTANCES,
            });
        }
        self.instances.push(*fish);
        Ok(())
    }

    pub fn pending_draw_call(&self) -> Option<DrawCall> {
        if self.instances.is_empty() {
            return None;
        }
        self.bindings()
            .map(|b| b.draw_call(self.instances.len() as u32))
    }

    pub fn draw<B: RenderBackend>(&mut self, ctx: &mut Context<B>) -> Result<()> {
        let result = self.submit_batch(ctx);
        self.instances.clear();
        result
    }

    fn submit_batch<B: RenderBackend>(&self, ctx: &mut Context<B>) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or(RenderError::ModelNotInitialized(KIND))?;
        if self.instances.is_empty() {
            return Ok(());
        }

        ctx.set_buffer_data(&state.instances, 0, bytemuck::cast_slice(&self.instances))?;
        ctx.submit_draw(&state.bindings.draw_call(self.instances.len() as u32))
    }

    /// Drops the staged batch without drawing it.
    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        if let Some(state) = self.state {
            state.bindings.release(ctx);
            ctx.destroy_buffer(state.fish_vertex);
            ctx.destroy_buffer(state.light_factor);
            ctx.destroy_buffer(state.instances);
        }
    }
}
