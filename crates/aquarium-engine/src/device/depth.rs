/// Depth-stencil attachment sized to the swapchain.
///
/// Recreated on every non-zero resize; the view is what frame passes bind.
pub struct DepthTarget {
    format: wgpu::TextureFormat,
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("aquarium depth-stencil"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            format,
            _texture: texture,
            view,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Whether the format carries a stencil aspect that must be cleared.
    pub fn has_stencil(&self) -> bool {
        self.format.has_stencil_aspect()
    }
}
