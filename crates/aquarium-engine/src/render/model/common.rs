use bytemuck::{Pod, Zeroable};

use crate::render::backend::RenderBackend;
use crate::render::context::Context;
use crate::render::draw::DrawCall;
use crate::render::error::{RenderError, Result};
use crate::render::pipeline::{InputState, VertexAttribute, VertexInput};
use crate::render::program::Program;
use crate::render::resources::{Buffer, Texture};
use crate::render::scene::{ResourceMap, keys};
use crate::render::types::{BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId};

pub(crate) const F: wgpu::ShaderStages = wgpu::ShaderStages::FRAGMENT;
pub(crate) const V: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX;

/// Specular response shared by every lit kind.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightFactorUniforms {
    pub shininess: f32,
    pub specular_factor: f32,
    pub _pad: [f32; 2],
}

impl Default for LightFactorUniforms {
    fn default() -> Self {
        Self {
            shininess: 50.0,
            specular_factor: 1.0,
            _pad: [0.0; 2],
        }
    }
}

/// Handles a model builds once in `init` and replays on every `draw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBindings {
    pub pipeline: PipelineId,
    pub pipeline_layout: PipelineLayoutId,
    /// The model-specific layout (one of the pipeline layout's groups).
    pub model_layout: BindGroupLayoutId,
    pub model_group: BindGroupId,
    /// `(group index, bind group)` in pipeline-layout order.
    pub bind_groups: Vec<(u32, BindGroupId)>,
    /// Layouts and groups created by the model itself, from the model group
    /// onward. The shared global groups are not listed.
    pub owned_groups: Vec<(BindGroupLayoutId, BindGroupId)>,
    /// `(slot, buffer)` matching the pipeline's input state.
    pub vertex_buffers: Vec<(u32, BufferId)>,
    pub index_buffer: BufferId,
    pub index_count: u32,
}

impl ModelBindings {
    pub fn draw_call(&self, instance_count: u32) -> DrawCall {
        DrawCall {
            pipeline: self.pipeline,
            bind_groups: self.bind_groups.clone(),
            vertex_buffers: self.vertex_buffers.clone(),
            index_buffer: self.index_buffer,
            index_format: wgpu::IndexFormat::Uint16,
            index_count: self.index_count,
            instance_count,
        }
    }

    /// Releases the pipeline, its layout and every model-owned group and
    /// group layout.
    pub(crate) fn release<B: RenderBackend>(self, ctx: &mut Context<B>) {
        ctx.destroy_pipeline(self.pipeline);
        ctx.destroy_pipeline_layout(self.pipeline_layout);
        for (layout, group) in self.owned_groups {
            ctx.destroy_bind_group(group);
            ctx.destroy_bind_group_layout(layout);
        }
    }
}

pub(crate) fn texture<'a>(
    resources: &ResourceMap<'a>,
    model: &'static str,
    name: &'static str,
) -> Result<&'a Texture> {
    resources
        .texture(name)
        .ok_or(RenderError::MissingResource { model, name })
}

pub(crate) fn buffer<'a>(
    resources: &ResourceMap<'a>,
    model: &'static str,
    name: &'static str,
) -> Result<&'a Buffer> {
    resources
        .buffer(name)
        .ok_or(RenderError::MissingResource { model, name })
}

/// Vertex and index buffers resolved for one model.
pub(crate) struct Mesh<'a> {
    pub vertices: Vec<&'a Buffer>,
    pub indices: &'a Buffer,
}

impl<'a> Mesh<'a> {
    /// Resolves `attributes` in slot order plus the index buffer.
    pub fn resolve(
        resources: &ResourceMap<'a>,
        model: &'static str,
        attributes: &[&'static str],
    ) -> Result<Self> {
        let vertices = attributes
            .iter()
            .map(|name| buffer(resources, model, *name))
            .collect::<Result<Vec<_>>>()?;
        let indices = buffer(resources, model, keys::INDICES)?;
        Ok(Self { vertices, indices })
    }

    /// Position, normal and texcoord; tangent and binormal only when both
    /// are present.
    pub fn resolve_optional_tangents(
        resources: &ResourceMap<'a>,
        model: &'static str,
    ) -> Result<Self> {
        let mut mesh = Self::resolve(
            resources,
            model,
            &[keys::POSITION, keys::NORMAL, keys::TEX_COORD],
        )?;
        if let (Some(tangent), Some(binormal)) = (
            resources.buffer(keys::TANGENT),
            resources.buffer(keys::BINORMAL),
        ) {
            mesh.vertices.push(tangent);
            mesh.vertices.push(binormal);
        }
        Ok(mesh)
    }

    pub fn has_tangents(&self) -> bool {
        self.vertices.len() == 5
    }

    /// One attribute per buffer: shader location `i` reads slot `i`.
    pub fn input_state(&self, model: &str) -> Result<InputState> {
        let mut attributes = Vec::with_capacity(self.vertices.len());
        let mut inputs = Vec::with_capacity(self.vertices.len());

        for (slot, buffer) in self.vertices.iter().enumerate() {
            let slot = slot as u32;
            let format = buffer.vertex_format().ok_or_else(|| {
                RenderError::Backend(format!(
                    "{model}: vertex buffer at slot {slot} has no vertex element layout"
                ))
            })?;
            attributes.push(VertexAttribute {
                shader_location: slot,
                slot,
                format,
                offset: 0,
            });
            inputs.push(VertexInput {
                slot,
                stride: buffer.data_size(),
                step_mode: wgpu::VertexStepMode::Vertex,
            });
        }

        Ok(InputState::new(attributes, inputs))
    }

    fn vertex_buffers(&self) -> Vec<(u32, BufferId)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(slot, b)| (slot as u32, b.id()))
            .collect()
    }
}

/// Builds the pipeline layout from `groups` (group index = position), the
/// pipeline, and the replayable bindings.
///
/// `model_index` names which entry of `groups` is the model's own; it and
/// every later entry belong to the model.
pub(crate) fn finish<B: RenderBackend>(
    ctx: &mut Context<B>,
    label: &str,
    program: &Program,
    mesh: &Mesh<'_>,
    groups: &[(BindGroupLayoutId, BindGroupId)],
    model_index: usize,
    enable_blend: bool,
) -> Result<ModelBindings> {
    let input_state = mesh.input_state(label)?;
    let layouts: Vec<BindGroupLayoutId> = groups.iter().map(|(l, _)| *l).collect();

    let pipeline_layout = ctx.make_pipeline_layout(label, &layouts)?;
    let pipeline =
        ctx.create_render_pipeline(label, pipeline_layout, program, &input_state, enable_blend)?;

    let (model_layout, model_group) = *groups
        .get(model_index)
        .ok_or(RenderError::PipelineLayoutMismatch {
            index: model_index as u32,
        })?;
    Ok(ModelBindings {
        pipeline,
        pipeline_layout,
        model_layout,
        model_group,
        bind_groups: groups
            .iter()
            .enumerate()
            .map(|(i, (_, g))| (i as u32, *g))
            .collect(),
        owned_groups: groups[model_index..].to_vec(),
        vertex_buffers: mesh.vertex_buffers(),
        index_buffer: mesh.indices.id(),
        index_count: mesh.indices.total_components(),
    })
}
