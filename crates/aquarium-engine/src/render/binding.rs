//! Bind-group layout and bind-group composition.
//!
//! A layout is an ordered list of `(slot, visibility, kind)` specs. A bind
//! group must cover exactly the slots its layout declares, each with a
//! resource of the declared kind. Both rules are checked here, once, when the
//! bind group is built; draw recording trusts them afterwards.

use super::error::{RenderError, Result};
use super::types::{BufferId, SamplerId, TextureId};

/// View dimension of a sampled texture binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ViewDimension {
    D2,
    Cube,
}

impl ViewDimension {
    pub fn to_wgpu(self) -> wgpu::TextureViewDimension {
        match self {
            ViewDimension::D2 => wgpu::TextureViewDimension::D2,
            ViewDimension::Cube => wgpu::TextureViewDimension::Cube,
        }
    }
}

/// Resource kind a binding slot accepts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindingKind {
    UniformBuffer,
    Sampler,
    SampledTexture(ViewDimension),
}

/// One binding declaration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BindingSpec {
    pub slot: u32,
    pub visibility: wgpu::ShaderStages,
    pub kind: BindingKind,
}

impl BindingSpec {
    pub const fn new(slot: u32, visibility: wgpu::ShaderStages, kind: BindingKind) -> Self {
        Self {
            slot,
            visibility,
            kind,
        }
    }

    pub const fn uniform(slot: u32, visibility: wgpu::ShaderStages) -> Self {
        Self::new(slot, visibility, BindingKind::UniformBuffer)
    }

    pub const fn sampler(slot: u32, visibility: wgpu::ShaderStages) -> Self {
        Self::new(slot, visibility, BindingKind::Sampler)
    }

    pub const fn texture(slot: u32, visibility: wgpu::ShaderStages) -> Self {
        Self::new(slot, visibility, BindingKind::SampledTexture(ViewDimension::D2))
    }

    pub const fn cube_texture(slot: u32, visibility: wgpu::ShaderStages) -> Self {
        Self::new(slot, visibility, BindingKind::SampledTexture(ViewDimension::Cube))
    }

    /// A spec visible to no stage is a disabled slot.
    pub fn is_enabled(&self) -> bool {
        !self.visibility.is_empty()
    }
}

/// Immutable layout schema.
///
/// Two layouts are interchangeable only when their spec sequences are equal,
/// which is exactly `PartialEq` on this type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BindGroupLayoutDesc {
    entries: Vec<BindingSpec>,
}

impl BindGroupLayoutDesc {
    /// Builds a layout from specs, dropping disabled ones and keeping the
    /// relative order of the rest.
    pub fn new(specs: impl IntoIterator<Item = BindingSpec>) -> Self {
        Self {
            entries: specs.into_iter().filter(BindingSpec::is_enabled).collect(),
        }
    }

    pub fn entries(&self) -> &[BindingSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spec(&self, slot: u32) -> Option<&BindingSpec> {
        self.entries.iter().find(|s| s.slot == slot)
    }

    pub fn is_compatible(&self, other: &BindGroupLayoutDesc) -> bool {
        self == other
    }

    /// Checks that `entries` cover every declared slot exactly once with a
    /// resource of the declared kind.
    pub fn validate(&self, entries: &[BindingEntry]) -> Result<()> {
        if entries.len() != self.entries.len() {
            return Err(RenderError::BindingCountMismatch {
                declared: self.entries.len(),
                supplied: entries.len(),
            });
        }

        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.slot == entry.slot) {
                return Err(RenderError::DuplicateSlot { slot: entry.slot });
            }

            let spec = self
                .spec(entry.slot)
                .ok_or(RenderError::UndeclaredSlot { slot: entry.slot })?;

            let actual = entry.resource.kind();
            if spec.kind != actual {
                return Err(RenderError::BindingKindMismatch {
                    slot: entry.slot,
                    expected: spec.kind,
                    actual,
                });
            }
        }

        Ok(())
    }

    pub(crate) fn to_wgpu_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.entries
            .iter()
            .map(|spec| wgpu::BindGroupLayoutEntry {
                binding: spec.slot,
                visibility: spec.visibility,
                ty: match spec.kind {
                    BindingKind::UniformBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    BindingKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                    BindingKind::SampledTexture(dim) => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: dim.to_wgpu(),
                        multisampled: false,
                    },
                },
                count: None,
            })
            .collect()
    }
}

/// A concrete resource bound to a slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingResource {
    Buffer {
        buffer: BufferId,
        offset: u64,
        size: u64,
    },
    Sampler(SamplerId),
    Texture {
        texture: TextureId,
        dimension: ViewDimension,
    },
}

impl BindingResource {
    pub fn kind(&self) -> BindingKind {
        match self {
            BindingResource::Buffer { .. } => BindingKind::UniformBuffer,
            BindingResource::Sampler(_) => BindingKind::Sampler,
            BindingResource::Texture { dimension, .. } => BindingKind::SampledTexture(*dimension),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingEntry {
    pub slot: u32,
    pub resource: BindingResource,
}

impl BindingEntry {
    pub const fn new(slot: u32, resource: BindingResource) -> Self {
        Self { slot, resource }
    }
}
