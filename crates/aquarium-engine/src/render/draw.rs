//! Per-frame draw descriptors.

use super::types::{BindGroupId, BufferId, PipelineId};

/// One indexed draw appended to the context's open pass.
///
/// A model rebuilds this from its `init`-time state on every `draw`, so two
/// draws of the same model differ only where per-instance data changed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub pipeline: PipelineId,
    /// `(group index, bind group)`, in ascending group order.
    pub bind_groups: Vec<(u32, BindGroupId)>,
    /// `(slot, buffer)`, in ascending slot order.
    pub vertex_buffers: Vec<(u32, BufferId)>,
    pub index_buffer: BufferId,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
    pub instance_count: u32,
}

/// Clear values for the frame pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearValues {
    pub color: wgpu::Color,
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearValues {
    /// Aquarium water tint, far depth, zero stencil.
    fn default() -> Self {
        Self {
            color: wgpu::Color {
                r: 0.0,
                g: 0.8,
                b: 1.0,
                a: 0.0,
            },
            depth: 1.0,
            stencil: 0,
        }
    }
}
