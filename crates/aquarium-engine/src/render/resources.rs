//! Buffer, texture and sampler wrappers.
//!
//! Each wrapper owns exactly one backend object through its handle and is
//! neither `Clone` nor `Copy`; the object is released by handing the wrapper
//! back to [`Context::destroy_buffer`](super::Context::destroy_buffer) /
//! [`Context::destroy_texture`](super::Context::destroy_texture), or when the
//! owning context is dropped. Models only ever copy the handles out.

use std::ops::Range;
use std::path::PathBuf;

use super::binding::{BindingResource, ViewDimension};
use super::error::{RenderError, Result};
use super::types::{BufferId, SamplerId, TextureId};

/// Scalar type of the elements stored in a typed buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementType {
    F32,
    U16,
}

impl ElementType {
    pub const fn size(self) -> u64 {
        match self {
            ElementType::F32 => 4,
            ElementType::U16 => 2,
        }
    }
}

/// Element layout of a typed vertex or index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ElementLayout {
    pub element: ElementType,
    /// Components per vertex (3 for positions, 2 for texcoords, 1 for indices).
    pub num_components: u32,
    /// Total scalar count in the buffer.
    pub total_components: u32,
    pub is_index: bool,
}

/// A GPU buffer.
#[derive(Debug)]
pub struct Buffer {
    id: BufferId,
    size: u64,
    usage: wgpu::BufferUsages,
    layout: Option<ElementLayout>,
}

impl Buffer {
    pub(crate) fn new(
        id: BufferId,
        size: u64,
        usage: wgpu::BufferUsages,
        layout: Option<ElementLayout>,
    ) -> Self {
        Self {
            id,
            size,
            usage,
            layout,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Capacity in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    pub fn layout(&self) -> Option<ElementLayout> {
        self.layout
    }

    pub fn num_components(&self) -> u32 {
        self.layout.map_or(0, |l| l.num_components)
    }

    pub fn total_components(&self) -> u32 {
        self.layout.map_or(0, |l| l.total_components)
    }

    /// Bytes per vertex; the stride of the input slot this buffer feeds.
    pub fn data_size(&self) -> u64 {
        self.layout
            .map_or(0, |l| u64::from(l.num_components) * l.element.size())
    }

    /// Vertex format matching this buffer's element layout.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        let layout = self.layout.filter(|l| !l.is_index)?;
        match (layout.element, layout.num_components) {
            (ElementType::F32, 1) => Some(wgpu::VertexFormat::Float32),
            (ElementType::F32, 2) => Some(wgpu::VertexFormat::Float32x2),
            (ElementType::F32, 3) => Some(wgpu::VertexFormat::Float32x3),
            (ElementType::F32, 4) => Some(wgpu::VertexFormat::Float32x4),
            _ => None,
        }
    }

    /// Whole-buffer uniform binding.
    pub fn binding(&self) -> BindingResource {
        BindingResource::Buffer {
            buffer: self.id,
            offset: 0,
            size: self.size,
        }
    }
}

/// Sampler configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SamplerDesc {
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::MipmapFilterMode,
}

impl SamplerDesc {
    /// Repeat-wrapped linear sampler used for 2D material textures.
    pub const fn linear_repeat() -> Self {
        Self {
            address_mode: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
        }
    }

    /// Edge-clamped linear sampler used for cubemaps.
    pub const fn linear_clamp() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            ..Self::linear_repeat()
        }
    }

    pub(crate) fn to_wgpu<'a>(&self, label: &'a str) -> wgpu::SamplerDescriptor<'a> {
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            mipmap_filter: self.mipmap_filter,
            ..Default::default()
        }
    }
}

/// `offset..offset + len`, checked against a buffer of `size` bytes.
pub(crate) fn buffer_range(offset: u64, len: u64, size: u64) -> Result<Range<u64>> {
    let end = offset
        .checked_add(len)
        .ok_or(RenderError::RangeOverflow { offset, len })?;
    if end > size {
        return Err(RenderError::BufferRange { offset, end, size });
    }
    Ok(offset..end)
}

/// Queue writes move whole 4-byte words; both ends of a write must be
/// word-aligned.
pub(crate) fn check_write_alignment(offset: u64, len: u64) -> Result<()> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    if offset % align != 0 || len % align != 0 {
        return Err(RenderError::UnalignedWrite { offset, len });
    }
    Ok(())
}

/// Where a texture's pixels come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// One image file, uploaded as a 2D texture.
    File(PathBuf),
    /// Six image files in +X, -X, +Y, -Y, +Z, -Z order, uploaded as a cubemap.
    Cube([PathBuf; 6]),
}

/// RGBA8 pixel data for a texture upload.
#[derive(Debug, Copy, Clone)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub dimension: ViewDimension,
    /// One tightly packed RGBA8 layer per face (1 for 2D, 6 for cubes).
    pub layers: &'a [&'a [u8]],
}

/// A sampled texture with its default view and sampler.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    sampler: SamplerId,
    name: String,
    dimension: ViewDimension,
    width: u32,
    height: u32,
}

impl Texture {
    pub(crate) fn new(
        id: TextureId,
        sampler: SamplerId,
        name: String,
        dimension: ViewDimension,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id,
            sampler,
            name,
            dimension,
            width,
            height,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn sampler(&self) -> SamplerId {
        self.sampler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> ViewDimension {
        self.dimension
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn view_binding(&self) -> BindingResource {
        BindingResource::Texture {
            texture: self.id,
            dimension: self.dimension,
        }
    }

    pub fn sampler_binding(&self) -> BindingResource {
        BindingResource::Sampler(self.sampler)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn buffer(layout: ElementLayout) -> Buffer {
        let mut ids = SlotMap::<BufferId, ()>::with_key();
        Buffer::new(ids.insert(()), 36, wgpu::BufferUsages::VERTEX, Some(layout))
    }

    #[test]
    fn vertex_buffer_stride_and_format() {
        let b = buffer(ElementLayout {
            element: ElementType::F32,
            num_components: 3,
            total_components: 9,
            is_index: false,
        });

        assert_eq!(b.data_size(), 12);
        assert_eq!(b.total_components(), 9);
        assert_eq!(b.vertex_format(), Some(wgpu::VertexFormat::Float32x3));
    }

    #[test]
    fn index_buffers_have_no_vertex_format() {
        let b = buffer(ElementLayout {
            element: ElementType::U16,
            num_components: 1,
            total_components: 3,
            is_index: true,
        });

        assert_eq!(b.vertex_format(), None);
        assert_eq!(b.data_size(), 2);
    }

    #[test]
    fn ranges_past_the_end_or_the_address_space_are_rejected() {
        assert_eq!(buffer_range(4, 8, 16).unwrap(), 4..12);
        assert!(matches!(
            buffer_range(12, 8, 16),
            Err(RenderError::BufferRange { end: 20, size: 16, .. })
        ));
        assert!(matches!(
            buffer_range(u64::MAX - 2, 8, 16),
            Err(RenderError::RangeOverflow { len: 8, .. })
        ));
    }

    #[test]
    fn writes_must_be_word_aligned() {
        assert!(check_write_alignment(8, 16).is_ok());
        assert!(matches!(
            check_write_alignment(2, 4),
            Err(RenderError::UnalignedWrite { offset: 2, len: 4 })
        ));
        assert!(matches!(
            check_write_alignment(0, 6),
            Err(RenderError::UnalignedWrite { offset: 0, len: 6 })
        ));
    }
}
