//! Vertex input state and the fixed render-pipeline policy.

use super::types::{PipelineLayoutId, ShaderModuleId};

/// Maps a shader location to a vertex buffer slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub shader_location: u32,
    pub slot: u32,
    pub format: wgpu::VertexFormat,
    pub offset: u64,
}

/// Stride and step mode of one vertex buffer slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexInput {
    pub slot: u32,
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
}

/// Attribute-to-slot mapping plus per-slot strides.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct InputState {
    attributes: Vec<VertexAttribute>,
    inputs: Vec<VertexInput>,
}

impl InputState {
    pub fn new(
        attributes: impl IntoIterator<Item = VertexAttribute>,
        inputs: impl IntoIterator<Item = VertexInput>,
    ) -> Self {
        let mut inputs: Vec<VertexInput> = inputs.into_iter().collect();
        inputs.sort_by_key(|i| i.slot);
        Self {
            attributes: attributes.into_iter().collect(),
            inputs,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Inputs sorted by slot.
    pub fn inputs(&self) -> &[VertexInput] {
        &self.inputs
    }

    pub fn slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.inputs.iter().map(|i| i.slot)
    }

    /// Per-slot wgpu attribute lists, in slot order.
    ///
    /// wgpu addresses vertex buffers by their position in the pipeline's
    /// buffer list, so slots must be dense from zero.
    pub(crate) fn wgpu_attributes(&self) -> Option<Vec<Vec<wgpu::VertexAttribute>>> {
        let dense = self
            .inputs
            .iter()
            .enumerate()
            .all(|(i, input)| input.slot == i as u32);
        if !dense {
            return None;
        }

        Some(
            self.inputs
                .iter()
                .map(|input| {
                    self.attributes
                        .iter()
                        .filter(|a| a.slot == input.slot)
                        .map(|a| wgpu::VertexAttribute {
                            format: a.format,
                            offset: a.offset,
                            shader_location: a.shader_location,
                        })
                        .collect()
                })
                .collect(),
        )
    }
}

/// Blend state for the single color target: replace or straight alpha.
pub fn blend_state(enable_blend: bool) -> wgpu::BlendState {
    let component = if enable_blend {
        wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        }
    } else {
        wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::Zero,
            operation: wgpu::BlendOperation::Add,
        }
    };

    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// Fixed pipeline policy shared by every model kind.
///
/// Depth test `Less` with writes, one color attachment in the swapchain
/// format, triangle lists, 16-bit indices. Only blending varies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PipelineState {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub blend: wgpu::BlendState,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write_enabled: bool,
    pub topology: wgpu::PrimitiveTopology,
    pub index_format: wgpu::IndexFormat,
    pub sample_count: u32,
}

impl PipelineState {
    pub fn fixed(
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        enable_blend: bool,
    ) -> Self {
        Self {
            color_format,
            depth_format,
            blend: blend_state(enable_blend),
            depth_compare: wgpu::CompareFunction::Less,
            depth_write_enabled: true,
            topology: wgpu::PrimitiveTopology::TriangleList,
            index_format: wgpu::IndexFormat::Uint16,
            sample_count: 1,
        }
    }

    pub fn is_blended(&self) -> bool {
        self.blend.color.dst_factor != wgpu::BlendFactor::Zero
    }
}

/// Everything a backend needs to build one render pipeline.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub layout: PipelineLayoutId,
    pub vertex_module: ShaderModuleId,
    pub fragment_module: ShaderModuleId,
    pub input_state: &'a InputState,
    pub state: PipelineState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(location: u32, format: wgpu::VertexFormat) -> VertexAttribute {
        VertexAttribute {
            shader_location: location,
            slot: location,
            format,
            offset: 0,
        }
    }

    fn input(slot: u32, stride: u64) -> VertexInput {
        VertexInput {
            slot,
            stride,
            step_mode: wgpu::VertexStepMode::Vertex,
        }
    }

    #[test]
    fn blend_toggle_selects_factors() {
        let opaque = blend_state(false);
        assert_eq!(opaque.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(opaque.color.dst_factor, wgpu::BlendFactor::Zero);

        let blended = blend_state(true);
        assert_eq!(blended.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blended.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn fixed_policy() {
        let state = PipelineState::fixed(
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureFormat::Depth24PlusStencil8,
            false,
        );

        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);
        assert!(state.depth_write_enabled);
        assert_eq!(state.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(state.index_format, wgpu::IndexFormat::Uint16);
        assert!(!state.is_blended());
    }

    #[test]
    fn attributes_group_by_dense_slot() {
        let state = InputState::new(
            [
                attr(0, wgpu::VertexFormat::Float32x3),
                attr(1, wgpu::VertexFormat::Float32x2),
            ],
            [input(1, 8), input(0, 12)],
        );

        assert_eq!(state.slots().collect::<Vec<_>>(), vec![0, 1]);
        let grouped = state.wgpu_attributes().unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[1][0].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn sparse_slots_are_rejected() {
        let state = InputState::new([attr(0, wgpu::VertexFormat::Float32x3)], [input(2, 12)]);
        assert!(state.wgpu_attributes().is_none());
    }
}
