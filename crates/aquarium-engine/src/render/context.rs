//! The render context: resource factory, binding bookkeeping and frame lifecycle.
//!
//! `Context` is the sole owner of every backend object. Models receive plain
//! handles from it and must not outlive it.
//!
//! Frame protocol:
//! - `pre_frame` (Ready -> FrameOpen) acquires an image and opens the shared pass
//! - every model `draw` appends one `DrawCall` through `submit_draw`
//! - `flush` (FrameOpen -> Ready) ends the pass, submits and presents
//!
//! Uniform writes go through the backend's queue-ordered `write_buffer`, which
//! lands before the next submission and after all earlier ones. A frame's
//! writes therefore never race the GPU reading the previous frame's values.

use std::path::Path;

use bytemuck::Pod;
use slotmap::SecondaryMap;

use super::backend::RenderBackend;
use super::binding::{BindGroupLayoutDesc, BindingEntry, BindingSpec, ViewDimension};
use super::draw::{ClearValues, DrawCall};
use super::error::{RenderError, Result};
use super::model::{Model, ModelGroup, ModelName};
use super::pipeline::{InputState, PipelineDesc, PipelineState};
use super::program::{Program, ShaderLibrary, ShaderStage};
use super::resources::{
    Buffer, ElementLayout, ElementType, SamplerDesc, Texture, TextureDesc, TextureSource,
    buffer_range, check_write_alignment,
};
use super::scene::SceneState;
use super::types::{BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId};

/// Lifecycle state of a [`Context`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextState {
    /// Between frames; resources may be created.
    Ready,
    /// A pass is open and accepts draws.
    FrameOpen,
    /// `terminate` was called; nothing further is accepted.
    Terminated,
}

/// Frame-wide uniforms and the bind groups exposing them.
///
/// Group layouts:
/// - general: `{0: light (fragment), 1: fog (fragment)}`
/// - world: `{0: light world position (vertex)}`
///
/// The view buffer is not part of either group; model layouts that need the
/// shared camera bind it directly.
#[derive(Debug)]
pub struct GlobalResources {
    pub general_layout: BindGroupLayoutId,
    pub world_layout: BindGroupLayoutId,
    pub general_group: BindGroupId,
    pub world_group: BindGroupId,
    pub light: Buffer,
    pub fog: Buffer,
    pub light_world_position: Buffer,
    pub view: Buffer,
}

pub struct Context<B: RenderBackend> {
    backend: B,
    state: ContextState,
    clear: ClearValues,

    layouts: SecondaryMap<BindGroupLayoutId, BindGroupLayoutDesc>,
    pipeline_layouts: SecondaryMap<PipelineLayoutId, Vec<BindGroupLayoutId>>,
    bind_groups: SecondaryMap<BindGroupId, BindGroupLayoutId>,
    pipelines: SecondaryMap<PipelineId, PipelineLayoutId>,

    globals: Option<GlobalResources>,
    frames: u64,
}

impl<B: RenderBackend> Context<B> {
    /// Wraps an initialized backend. Device and swapchain creation (and their
    /// fatal failures) happen when the backend is built.
    pub fn new(backend: B) -> Self {
        let (width, height) = backend.size();
        log::info!(
            "render context on {} backend, {width}x{height}, color {:?}, depth {:?}",
            backend.name(),
            backend.surface_format(),
            backend.depth_format()
        );

        Self {
            backend,
            state: ContextState::Ready,
            clear: ClearValues::default(),
            layouts: SecondaryMap::new(),
            pipeline_layouts: SecondaryMap::new(),
            bind_groups: SecondaryMap::new(),
            pipelines: SecondaryMap::new(),
            globals: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Drawable size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.backend.size()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    /// Number of frames flushed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn clear_values(&self) -> ClearValues {
        self.clear
    }

    pub fn set_clear_values(&mut self, clear: ClearValues) {
        self.clear = clear;
    }

    fn expect_state(&self, expected: ContextState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == ContextState::Terminated {
            return Err(RenderError::InvalidState {
                expected: ContextState::Ready,
                actual: ContextState::Terminated,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: ContextState) {
        log::debug!("context {:?} -> {next:?}", self.state);
        self.state = next;
    }

    // ---------------------------------------------------------------------
    // Buffers
    // ---------------------------------------------------------------------

    pub fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<Buffer> {
        self.ensure_live()?;
        let id = self.backend.create_buffer(label, size, usage)?;
        Ok(Buffer::new(id, size, usage, None))
    }

    /// Allocates a buffer and uploads `data` before returning.
    pub fn create_buffer_from_data(
        &mut self,
        label: &str,
        data: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<Buffer> {
        self.ensure_live()?;
        let id = self.backend.create_buffer_init(label, data, usage)?;
        Ok(Buffer::new(id, data.len() as u64, usage, None))
    }

    /// Uniform buffer holding one `T`.
    pub fn create_uniform_buffer<T: Pod>(&mut self, label: &str, value: &T) -> Result<Buffer> {
        self.create_buffer_from_data(label, bytemuck::bytes_of(value), wgpu::BufferUsages::UNIFORM)
    }

    /// Vertex buffer of `f32` elements, `num_components` per vertex.
    pub fn create_vertex_buffer(
        &mut self,
        label: &str,
        num_components: u32,
        data: &[f32],
    ) -> Result<Buffer> {
        self.ensure_live()?;
        let usage = wgpu::BufferUsages::VERTEX;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let id = self.backend.create_buffer_init(label, bytes, usage)?;
        Ok(Buffer::new(
            id,
            bytes.len() as u64,
            usage,
            Some(ElementLayout {
                element: ElementType::F32,
                num_components,
                total_components: data.len() as u32,
                is_index: false,
            }),
        ))
    }

    /// 16-bit index buffer.
    pub fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> Result<Buffer> {
        self.ensure_live()?;
        let usage = wgpu::BufferUsages::INDEX;
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let id = self.backend.create_buffer_init(label, bytes, usage)?;
        Ok(Buffer::new(
            id,
            bytes.len() as u64,
            usage,
            Some(ElementLayout {
                element: ElementType::U16,
                num_components: 1,
                total_components: indices.len() as u32,
                is_index: true,
            }),
        ))
    }

    /// Overwrites `data.len()` bytes at `offset`.
    ///
    /// `offset` and `data.len()` must be multiples of 4 and the range must lie
    /// within the buffer. Rejected writes leave the buffer unchanged.
    pub fn set_buffer_data(&mut self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<()> {
        self.ensure_live()?;
        check_write_alignment(offset, data.len() as u64)?;
        buffer_range(offset, data.len() as u64, buffer.size())?;
        self.backend.write_buffer(buffer.id(), offset, data)
    }

    pub fn read_buffer_data(&mut self, buffer: &Buffer, offset: u64, size: u64) -> Result<Vec<u8>> {
        buffer_range(offset, size, buffer.size())?;
        self.backend.read_buffer(buffer.id(), offset, size)
    }

    pub fn destroy_buffer(&mut self, buffer: Buffer) {
        self.backend.destroy_buffer(buffer.id());
    }

    // ---------------------------------------------------------------------
    // Textures and programs
    // ---------------------------------------------------------------------

    /// Loads a 2D texture or a cubemap from image files. Blocks until the
    /// pixels are uploaded.
    pub fn create_texture(&mut self, name: &str, source: &TextureSource) -> Result<Texture> {
        match source {
            TextureSource::File(path) => {
                let image = decode_rgba(path)?;
                let (width, height) = image.dimensions();
                self.create_texture_from_rgba(
                    name,
                    ViewDimension::D2,
                    width,
                    height,
                    &[image.as_raw().as_slice()],
                )
            }
            TextureSource::Cube(paths) => {
                let faces = paths
                    .iter()
                    .map(|p| decode_rgba(p))
                    .collect::<Result<Vec<_>>>()?;
                let (width, height) = faces[0].dimensions();
                if faces.iter().any(|f| f.dimensions() != (width, height)) {
                    return Err(RenderError::InvalidTexture {
                        name: name.to_owned(),
                        reason: "cubemap faces differ in size".into(),
                    });
                }
                let layers: Vec<&[u8]> = faces.iter().map(|f| f.as_raw().as_slice()).collect();
                self.create_texture_from_rgba(name, ViewDimension::Cube, width, height, &layers)
            }
        }
    }

    /// Uploads tightly packed RGBA8 layers: one for 2D, six for a cubemap.
    pub fn create_texture_from_rgba(
        &mut self,
        name: &str,
        dimension: ViewDimension,
        width: u32,
        height: u32,
        layers: &[&[u8]],
    ) -> Result<Texture> {
        self.ensure_live()?;

        let invalid = |reason: String| RenderError::InvalidTexture {
            name: name.to_owned(),
            reason,
        };
        let expected_layers = match dimension {
            ViewDimension::D2 => 1,
            ViewDimension::Cube => 6,
        };
        if layers.len() != expected_layers {
            return Err(invalid(format!(
                "{dimension:?} texture needs {expected_layers} layers, got {}",
                layers.len()
            )));
        }
        if width == 0 || height == 0 {
            return Err(invalid("zero-sized image".into()));
        }
        let layer_bytes = 4 * width as usize * height as usize;
        if let Some(bad) = layers.iter().find(|l| l.len() != layer_bytes) {
            return Err(invalid(format!(
                "layer holds {} bytes, {width}x{height} RGBA8 needs {layer_bytes}",
                bad.len()
            )));
        }

        let id = self.backend.create_texture(&TextureDesc {
            label: name,
            width,
            height,
            dimension,
            layers,
        })?;

        let sampler_desc = match dimension {
            ViewDimension::D2 => SamplerDesc::linear_repeat(),
            ViewDimension::Cube => SamplerDesc::linear_clamp(),
        };
        let sampler = self.backend.create_sampler(name, &sampler_desc);

        Ok(Texture::new(id, sampler, name.to_owned(), dimension, width, height))
    }

    /// Releases the texture together with its sampler.
    pub fn destroy_texture(&mut self, texture: Texture) {
        self.backend.destroy_texture(texture.id());
        self.backend.destroy_sampler(texture.sampler());
    }

    /// Fetches and compiles a vertex/fragment pair.
    ///
    /// Missing sources are errors. Compile failures are not: the program comes
    /// back invalid and `create_render_pipeline` rejects it.
    pub fn create_program(
        &mut self,
        library: &dyn ShaderLibrary,
        vertex_id: &str,
        fragment_id: &str,
    ) -> Result<Program> {
        self.ensure_live()?;

        let vs = library
            .source(vertex_id)
            .ok_or_else(|| RenderError::ShaderSourceNotFound(vertex_id.to_owned()))?;
        let fs = library
            .source(fragment_id)
            .ok_or_else(|| RenderError::ShaderSourceNotFound(fragment_id.to_owned()))?;

        let vertex = self
            .backend
            .create_shader_module(vertex_id, ShaderStage::Vertex, &vs);
        let fragment = self
            .backend
            .create_shader_module(fragment_id, ShaderStage::Fragment, &fs);

        Ok(Program::new(vertex, fragment))
    }

    // ---------------------------------------------------------------------
    // Layouts, bind groups, pipelines
    // ---------------------------------------------------------------------

    /// Builds a layout from `specs`, dropping those visible to no stage.
    pub fn make_bind_group_layout(
        &mut self,
        label: &str,
        specs: impl IntoIterator<Item = BindingSpec>,
    ) -> Result<BindGroupLayoutId> {
        self.ensure_live()?;
        let desc = BindGroupLayoutDesc::new(specs);
        let id = self.backend.create_bind_group_layout(label, &desc)?;
        self.layouts.insert(id, desc);
        Ok(id)
    }

    pub fn layout_desc(&self, layout: BindGroupLayoutId) -> Option<&BindGroupLayoutDesc> {
        self.layouts.get(layout)
    }

    /// Group index `n` of the result is `layouts[n]`.
    pub fn make_pipeline_layout(
        &mut self,
        label: &str,
        layouts: &[BindGroupLayoutId],
    ) -> Result<PipelineLayoutId> {
        self.ensure_live()?;
        if layouts.iter().any(|l| !self.layouts.contains_key(*l)) {
            return Err(RenderError::StaleHandle("bind group layout"));
        }
        let id = self.backend.create_pipeline_layout(label, layouts)?;
        self.pipeline_layouts.insert(id, layouts.to_vec());
        Ok(id)
    }

    pub fn pipeline_layout_groups(&self, layout: PipelineLayoutId) -> Option<&[BindGroupLayoutId]> {
        self.pipeline_layouts.get(layout).map(Vec::as_slice)
    }

    /// Binds concrete resources to `layout`'s slots.
    ///
    /// `entries` must cover every declared slot exactly once with a resource
    /// of the declared kind; anything else is a configuration error.
    pub fn make_bind_group(
        &mut self,
        label: &str,
        layout: BindGroupLayoutId,
        entries: &[BindingEntry],
    ) -> Result<BindGroupId> {
        self.ensure_live()?;
        let desc = self
            .layouts
            .get(layout)
            .ok_or(RenderError::StaleHandle("bind group layout"))?;
        desc.validate(entries)?;

        let id = self.backend.create_bind_group(label, layout, entries)?;
        self.bind_groups.insert(id, layout);
        Ok(id)
    }

    pub fn bind_group_layout_of(&self, group: BindGroupId) -> Option<BindGroupLayoutId> {
        self.bind_groups.get(group).copied()
    }

    /// Creates a pipeline with the fixed policy: `Less` depth test with
    /// writes, one color target in the swapchain format, triangle lists,
    /// 16-bit indices. Only blending is configurable.
    pub fn create_render_pipeline(
        &mut self,
        label: &str,
        layout: PipelineLayoutId,
        program: &Program,
        input_state: &InputState,
        enable_blend: bool,
    ) -> Result<PipelineId> {
        self.ensure_live()?;
        if !program.is_valid() {
            let module = if program.vertex().valid {
                program.fragment()
            } else {
                program.vertex()
            };
            return Err(RenderError::InvalidShaderModule(module.label.clone()));
        }
        if !self.pipeline_layouts.contains_key(layout) {
            return Err(RenderError::StaleHandle("pipeline layout"));
        }

        let state = PipelineState::fixed(
            self.backend.surface_format(),
            self.backend.depth_format(),
            enable_blend,
        );
        let id = self.backend.create_render_pipeline(&PipelineDesc {
            label,
            layout,
            vertex_module: program.vertex().id,
            fragment_module: program.fragment().id,
            input_state,
            state,
        })?;
        self.pipelines.insert(id, layout);
        Ok(id)
    }

    pub fn pipeline_layout_of(&self, pipeline: PipelineId) -> Option<PipelineLayoutId> {
        self.pipelines.get(pipeline).copied()
    }

    pub fn destroy_pipeline(&mut self, pipeline: PipelineId) {
        self.pipelines.remove(pipeline);
        self.backend.destroy_pipeline(pipeline);
    }

    pub fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutId) {
        self.pipeline_layouts.remove(layout);
        self.backend.destroy_pipeline_layout(layout);
    }

    pub fn destroy_bind_group(&mut self, group: BindGroupId) {
        self.bind_groups.remove(group);
        self.backend.destroy_bind_group(group);
    }

    /// Groups and pipeline layouts built from `layout` must be destroyed
    /// first.
    pub fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutId) {
        self.layouts.remove(layout);
        self.backend.destroy_bind_group_layout(layout);
    }

    // ---------------------------------------------------------------------
    // Global resources
    // ---------------------------------------------------------------------

    /// Creates the frame-wide uniform buffers and bind groups from `scene`.
    ///
    /// Must run once before any model `init`. Calling it again only
    /// re-uploads the uniform values.
    pub fn init_general_resources(&mut self, scene: &SceneState) -> Result<()> {
        self.ensure_live()?;

        if self.globals.is_some() {
            log::debug!("general resources already exist, refreshing uniforms");
            self.update_general_uniforms(scene);
            self.update_world_uniforms(scene);
            return Ok(());
        }

        let light = self.create_uniform_buffer("light uniforms", &scene.light)?;
        let fog = self.create_uniform_buffer("fog uniforms", &scene.fog)?;
        let light_world_position =
            self.create_uniform_buffer("light world position", &scene.light_world_position)?;
        let view = self.create_uniform_buffer("view uniforms", &scene.view)?;

        const F: wgpu::ShaderStages = wgpu::ShaderStages::FRAGMENT;
        const V: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX;

        let general_layout = self.make_bind_group_layout(
            "general layout",
            [BindingSpec::uniform(0, F), BindingSpec::uniform(1, F)],
        )?;
        let world_layout =
            self.make_bind_group_layout("world layout", [BindingSpec::uniform(0, V)])?;

        let general_group = self.make_bind_group(
            "general group",
            general_layout,
            &[
                BindingEntry::new(0, light.binding()),
                BindingEntry::new(1, fog.binding()),
            ],
        )?;
        let world_group = self.make_bind_group(
            "world group",
            world_layout,
            &[BindingEntry::new(0, light_world_position.binding())],
        )?;

        self.globals = Some(GlobalResources {
            general_layout,
            world_layout,
            general_group,
            world_group,
            light,
            fog,
            light_world_position,
            view,
        });
        Ok(())
    }

    pub fn globals(&self) -> Result<&GlobalResources> {
        self.globals.as_ref().ok_or(RenderError::GlobalsMissing)
    }

    /// Re-uploads light and fog.
    pub fn update_general_uniforms(&mut self, scene: &SceneState) {
        let Some(globals) = self.globals.as_ref() else {
            return;
        };
        let (light, fog) = (globals.light.id(), globals.fog.id());
        self.write_global("light", light, bytemuck::bytes_of(&scene.light));
        self.write_global("fog", fog, bytemuck::bytes_of(&scene.fog));
    }

    /// Per-frame camera update: light world position and shared view.
    pub fn update_world_uniforms(&mut self, scene: &SceneState) {
        let Some(globals) = self.globals.as_ref() else {
            log::warn!("update_world_uniforms before init_general_resources");
            return;
        };
        let (position, view) = (globals.light_world_position.id(), globals.view.id());
        self.write_global(
            "light world position",
            position,
            bytemuck::bytes_of(&scene.light_world_position),
        );
        self.write_global("view", view, bytemuck::bytes_of(&scene.view));
    }

    fn write_global(&mut self, what: &str, buffer: BufferId, data: &[u8]) {
        if let Err(err) = self.backend.write_buffer(buffer, 0, data) {
            log::error!("{what} uniform upload failed: {err}");
        }
    }

    // ---------------------------------------------------------------------
    // Frame lifecycle
    // ---------------------------------------------------------------------

    /// Acquires the next image and opens the frame pass, clearing color,
    /// depth and stencil.
    ///
    /// A [`RenderError::FrameUnavailable`] leaves the context `Ready`; the
    /// caller skips this frame.
    pub fn pre_frame(&mut self) -> Result<()> {
        self.expect_state(ContextState::Ready)?;
        self.backend.begin_frame(&self.clear)?;
        self.transition(ContextState::FrameOpen);
        Ok(())
    }

    /// Appends one draw to the open pass.
    ///
    /// Debug builds also check the draw against its pipeline layout.
    pub fn submit_draw(&mut self, call: &DrawCall) -> Result<()> {
        self.expect_state(ContextState::FrameOpen)?;
        if cfg!(debug_assertions) {
            self.check_draw_call(call)?;
        }
        self.backend.draw(call);
        Ok(())
    }

    /// Ends the pass, submits and presents. Window events are pumped by the
    /// runtime after this returns.
    pub fn flush(&mut self) -> Result<()> {
        self.expect_state(ContextState::FrameOpen)?;
        let result = self.backend.end_frame();
        self.transition(ContextState::Ready);
        self.frames += 1;
        result
    }

    /// Moves to `Terminated`. Idempotent; an open frame is discarded.
    pub fn terminate(&mut self) {
        if self.state == ContextState::FrameOpen {
            if let Err(err) = self.backend.end_frame() {
                log::warn!("discarding open frame: {err}");
            }
        }
        if self.state != ContextState::Terminated {
            self.transition(ContextState::Terminated);
        }
    }

    /// Verifies that the n-th bind group of `call` was created from the n-th
    /// layout of the pipeline's layout.
    pub fn check_draw_call(&self, call: &DrawCall) -> Result<()> {
        let layout = self
            .pipelines
            .get(call.pipeline)
            .ok_or(RenderError::StaleHandle("pipeline"))?;
        let groups = self
            .pipeline_layouts
            .get(*layout)
            .ok_or(RenderError::StaleHandle("pipeline layout"))?;

        if call.bind_groups.len() != groups.len() {
            return Err(RenderError::PipelineLayoutMismatch {
                index: call.bind_groups.len().min(groups.len()) as u32,
            });
        }

        for (position, (index, group)) in call.bind_groups.iter().enumerate() {
            let expected = groups.get(*index as usize);
            let actual = self.bind_groups.get(*group);
            if *index as usize != position || expected.is_none() || expected != actual {
                return Err(RenderError::PipelineLayoutMismatch { index: *index });
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Models
    // ---------------------------------------------------------------------

    /// Creates an uninitialized model renderer for `name` in the group named
    /// by `group`. An unrecognized tag is logged and yields `None`.
    pub fn create_model(&self, group: &str, name: ModelName, enable_blend: bool) -> Option<Model> {
        match group.parse::<ModelGroup>() {
            Ok(group) => Some(Model::new(group, name, enable_blend)),
            Err(err) => {
                log::error!("cannot create {name}: {err}");
                None
            }
        }
    }
}

fn decode_rgba(path: &Path) -> Result<image::RgbaImage> {
    let image = image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;
    use crate::render::binding::BindingResource;

    fn context() -> Context<HeadlessBackend> {
        Context::new(HeadlessBackend::new(64, 64))
    }

    #[test]
    fn frame_state_machine() {
        let mut ctx = context();
        assert_eq!(ctx.state(), ContextState::Ready);
        assert!(matches!(
            ctx.flush(),
            Err(RenderError::InvalidState { expected: ContextState::FrameOpen, .. })
        ));

        ctx.pre_frame().unwrap();
        assert_eq!(ctx.state(), ContextState::FrameOpen);
        assert!(ctx.pre_frame().is_err());

        ctx.flush().unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);
        assert_eq!(ctx.frame_count(), 1);
    }

    #[test]
    fn terminated_context_rejects_work() {
        let mut ctx = context();
        ctx.pre_frame().unwrap();
        ctx.terminate();
        ctx.terminate();

        assert_eq!(ctx.state(), ContextState::Terminated);
        assert!(ctx.pre_frame().is_err());
        let late = ctx.create_buffer("late", 16, wgpu::BufferUsages::UNIFORM);
        assert!(late.is_err());
    }

    #[test]
    fn typed_buffers_record_element_layout() {
        let mut ctx = context();
        let positions = ctx
            .create_vertex_buffer("position", 3, &[0.0; 9])
            .unwrap();
        let indices = ctx.create_index_buffer("indices", &[0, 1, 2]).unwrap();

        assert_eq!(positions.data_size(), 12);
        assert_eq!(positions.total_components(), 9);
        assert_eq!(indices.total_components(), 3);
        assert_eq!(indices.size(), 6);
    }

    #[test]
    fn readback_past_end_is_rejected() {
        let mut ctx = context();
        let buffer = ctx
            .create_buffer("ubo", 16, wgpu::BufferUsages::UNIFORM)
            .unwrap();

        assert!(matches!(
            ctx.read_buffer_data(&buffer, 8, 16),
            Err(RenderError::BufferRange { end: 24, size: 16, .. })
        ));
    }

    #[test]
    fn texture_layer_counts_are_checked() {
        let mut ctx = context();
        let pixel = [255u8; 4];

        let tex = ctx
            .create_texture_from_rgba("diffuse", ViewDimension::D2, 1, 1, &[&pixel])
            .unwrap();
        assert_eq!(tex.size(), (1, 1));

        let err = ctx
            .create_texture_from_rgba("sky", ViewDimension::Cube, 1, 1, &[&pixel])
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidTexture { .. }));
    }

    #[test]
    fn bind_group_must_match_its_layout() {
        let mut ctx = context();
        let layout = ctx
            .make_bind_group_layout(
                "pair",
                [
                    BindingSpec::uniform(0, wgpu::ShaderStages::FRAGMENT),
                    BindingSpec::uniform(1, wgpu::ShaderStages::NONE),
                ],
            )
            .unwrap();
        assert_eq!(ctx.layout_desc(layout).unwrap().len(), 1);

        let buffer = ctx
            .create_buffer("ubo", 16, wgpu::BufferUsages::UNIFORM)
            .unwrap();
        let entry = BindingEntry::new(0, buffer.binding());
        let group = ctx.make_bind_group("ok", layout, &[entry]).unwrap();
        assert_eq!(ctx.bind_group_layout_of(group), Some(layout));

        let extra = BindingEntry::new(
            1,
            BindingResource::Buffer {
                buffer: buffer.id(),
                offset: 0,
                size: 16,
            },
        );
        assert!(ctx.make_bind_group("bad", layout, &[entry, extra]).is_err());
    }

    #[test]
    fn unknown_model_group_yields_none() {
        let ctx = context();
        assert!(ctx.create_model("kelp", ModelName::SeaweedA, false).is_none());
        let seaweed = ctx.create_model("seaweed", ModelName::SeaweedA, true);
        assert!(seaweed.is_some());
    }
}
