use std::num::NonZeroU64;

use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::device::{Gpu, GpuFrame};
use crate::render::binding::{BindGroupLayoutDesc, BindingEntry, BindingResource};
use crate::render::draw::{ClearValues, DrawCall};
use crate::render::error::{RenderError, Result};
use crate::render::pipeline::PipelineDesc;
use crate::render::program::{check_wgsl, ShaderModule, ShaderStage};
use crate::render::resources::{
    SamplerDesc, TextureDesc, buffer_range, check_write_alignment,
};
use crate::render::types::{
    BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId, SamplerId,
    ShaderModuleId, TextureId,
};

use super::RenderBackend;

struct GpuTexture {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct OpenFrame {
    /// Declared before `frame` so it is dropped first.
    pass: wgpu::RenderPass<'static>,
    frame: GpuFrame,
}

/// Backend driving a real wgpu device and window surface.
///
/// Every GPU object lives in a slot map keyed by the handle types in
/// [`crate::render::types`]. The frame pass is opened in `begin_frame` with
/// its lifetime detached from the encoder, so draws can be appended from
/// independent `draw` calls until `end_frame` closes it.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    name: String,

    buffers: SlotMap<BufferId, wgpu::Buffer>,
    textures: SlotMap<TextureId, GpuTexture>,
    samplers: SlotMap<SamplerId, wgpu::Sampler>,
    /// `None` for modules that failed to compile.
    shader_modules: SlotMap<ShaderModuleId, Option<wgpu::ShaderModule>>,
    bind_group_layouts: SlotMap<BindGroupLayoutId, wgpu::BindGroupLayout>,
    pipeline_layouts: SlotMap<PipelineLayoutId, wgpu::PipelineLayout>,
    bind_groups: SlotMap<BindGroupId, wgpu::BindGroup>,
    pipelines: SlotMap<PipelineId, wgpu::RenderPipeline>,

    open: Option<OpenFrame>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let name = format!("{:?}", gpu.adapter_info().backend).to_lowercase();
        Self {
            gpu,
            name,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            shader_modules: SlotMap::with_key(),
            bind_group_layouts: SlotMap::with_key(),
            pipeline_layouts: SlotMap::with_key(),
            bind_groups: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            open: None,
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }
}

/// Buffer copies and queue writes operate on 4-byte units.
fn align4(n: u64) -> u64 {
    n.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

impl RenderBackend for WgpuBackend<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn surface_format(&self) -> wgpu::TextureFormat {
        self.gpu.surface_format()
    }

    fn depth_format(&self) -> wgpu::TextureFormat {
        self.gpu.depth().format()
    }

    fn size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }

    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId> {
        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: align4(size.max(1)),
            usage: usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        Ok(self.buffers.insert(buffer))
    }

    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId> {
        let buffer = self
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            });
        Ok(self.buffers.insert(buffer))
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let target = self
            .buffers
            .get(buffer)
            .ok_or(RenderError::StaleHandle("buffer"))?;

        check_write_alignment(offset, data.len() as u64)?;
        buffer_range(offset, data.len() as u64, target.size())?;
        self.gpu.queue().write_buffer(target, offset, data);
        Ok(())
    }

    fn read_buffer(&mut self, buffer: BufferId, offset: u64, size: u64) -> Result<Vec<u8>> {
        let source = self
            .buffers
            .get(buffer)
            .ok_or(RenderError::StaleHandle("buffer"))?;

        let end = buffer_range(offset, size, source.size())?.end;
        let start = offset - offset % wgpu::COPY_BUFFER_ALIGNMENT;
        let copy_len = align4(end).min(source.size()) - start;

        let device = self.gpu.device();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("aquarium readback"),
            size: copy_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("aquarium readback encoder"),
        });
        encoder.copy_buffer_to_buffer(source, start, &staging, 0, copy_len);
        self.gpu.queue().submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| RenderError::Backend(format!("device poll failed: {e}")))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RenderError::Backend(format!("readback map failed: {e}"))),
            Err(_) => return Err(RenderError::Backend("readback map never completed".into())),
        }

        let skip = (offset - start) as usize;
        let bytes = {
            let mapped = slice.get_mapped_range();
            mapped[skip..skip + size as usize].to_vec()
        };
        staging.unmap();
        Ok(bytes)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if let Some(b) = self.buffers.remove(buffer) {
            b.destroy();
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let layers = desc.layers.len() as u32;
        let texture = self.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, pixels) in desc.layers.iter().enumerate() {
            self.gpu.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * desc.width),
                    rows_per_image: Some(desc.height),
                },
                wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label),
            dimension: Some(desc.dimension.to_wgpu()),
            ..Default::default()
        });

        Ok(self.textures.insert(GpuTexture {
            _texture: texture,
            view,
        }))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture);
    }

    fn create_sampler(&mut self, label: &str, desc: &SamplerDesc) -> SamplerId {
        let sampler = self.device().create_sampler(&desc.to_wgpu(label));
        self.samplers.insert(sampler)
    }

    fn destroy_sampler(&mut self, sampler: SamplerId) {
        self.samplers.remove(sampler);
    }

    fn create_shader_module(
        &mut self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> ShaderModule {
        let valid = check_wgsl(label, source);
        let module = valid.then(|| {
            self.device()
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
        });

        ShaderModule {
            id: self.shader_modules.insert(module),
            label: label.to_owned(),
            stage,
            valid,
        }
    }

    fn create_bind_group_layout(
        &mut self,
        label: &str,
        desc: &BindGroupLayoutDesc,
    ) -> Result<BindGroupLayoutId> {
        let entries = desc.to_wgpu_entries();
        let layout = self
            .device()
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            });
        Ok(self.bind_group_layouts.insert(layout))
    }

    fn create_pipeline_layout(
        &mut self,
        label: &str,
        layouts: &[BindGroupLayoutId],
    ) -> Result<PipelineLayoutId> {
        let groups = layouts
            .iter()
            .map(|id| {
                self.bind_group_layouts
                    .get(*id)
                    .ok_or(RenderError::StaleHandle("bind group layout"))
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = self
            .gpu
            .device()
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &groups,
                immediate_size: 0,
            });
        Ok(self.pipeline_layouts.insert(layout))
    }

    fn create_bind_group(
        &mut self,
        label: &str,
        layout: BindGroupLayoutId,
        entries: &[BindingEntry],
    ) -> Result<BindGroupId> {
        let layout = self
            .bind_group_layouts
            .get(layout)
            .ok_or(RenderError::StaleHandle("bind group layout"))?;

        let resolved = entries
            .iter()
            .map(|entry| {
                let resource = match entry.resource {
                    BindingResource::Buffer {
                        buffer,
                        offset,
                        size,
                    } => wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: self
                            .buffers
                            .get(buffer)
                            .ok_or(RenderError::StaleHandle("buffer"))?,
                        offset,
                        size: NonZeroU64::new(size),
                    }),
                    BindingResource::Sampler(sampler) => wgpu::BindingResource::Sampler(
                        self.samplers
                            .get(sampler)
                            .ok_or(RenderError::StaleHandle("sampler"))?,
                    ),
                    BindingResource::Texture { texture, .. } => {
                        wgpu::BindingResource::TextureView(
                            &self
                                .textures
                                .get(texture)
                                .ok_or(RenderError::StaleHandle("texture"))?
                                .view,
                        )
                    }
                };
                Ok(wgpu::BindGroupEntry {
                    binding: entry.slot,
                    resource,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let group = self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &resolved,
            });
        Ok(self.bind_groups.insert(group))
    }

    fn create_render_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineId> {
        let layout = self
            .pipeline_layouts
            .get(desc.layout)
            .ok_or(RenderError::StaleHandle("pipeline layout"))?;

        let module = |id: ShaderModuleId| {
            self.shader_modules
                .get(id)
                .ok_or(RenderError::StaleHandle("shader module"))?
                .as_ref()
                .ok_or_else(|| RenderError::InvalidShaderModule(desc.label.to_owned()))
        };
        let vertex = module(desc.vertex_module)?;
        let fragment = module(desc.fragment_module)?;

        let attributes = desc.input_state.wgpu_attributes().ok_or_else(|| {
            RenderError::Backend(format!(
                "pipeline `{}`: vertex slots must be dense from 0",
                desc.label
            ))
        })?;
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .input_state
            .inputs()
            .iter()
            .zip(&attributes)
            .map(|(input, attrs)| wgpu::VertexBufferLayout {
                array_stride: input.stride,
                step_mode: input.step_mode,
                attributes: attrs,
            })
            .collect();

        let state = desc.state;
        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: None,
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: None,
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: state.color_format,
                        blend: Some(state.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: state.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: state.depth_format,
                    depth_write_enabled: state.depth_write_enabled,
                    depth_compare: state.depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),

                multisample: wgpu::MultisampleState {
                    count: state.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },

                multiview_mask: None,
                cache: None,
            });
        Ok(self.pipelines.insert(pipeline))
    }

    fn destroy_bind_group(&mut self, group: BindGroupId) {
        self.bind_groups.remove(group);
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutId) {
        self.bind_group_layouts.remove(layout);
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutId) {
        self.pipeline_layouts.remove(layout);
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineId) {
        self.pipelines.remove(pipeline);
    }

    fn begin_frame(&mut self, clear: &ClearValues) -> Result<()> {
        let mut frame = match self.gpu.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("surface error: {err}");
                return if self.gpu.handle_surface_error(err).is_fatal() {
                    Err(RenderError::Backend("surface out of memory".into()))
                } else {
                    Err(RenderError::FrameUnavailable)
                };
            }
        };

        let depth = self.gpu.depth();
        let stencil_ops = depth.has_stencil().then_some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear.stencil),
            store: wgpu::StoreOp::Store,
        });

        let pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("aquarium frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.open = Some(OpenFrame { pass, frame });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let pass = &mut open.pass;

        let Some(pipeline) = self.pipelines.get(call.pipeline) else {
            log::error!("draw with stale pipeline handle");
            return;
        };
        pass.set_pipeline(pipeline);

        for (index, group) in &call.bind_groups {
            if let Some(group) = self.bind_groups.get(*group) {
                pass.set_bind_group(*index, group, &[]);
            }
        }
        for (slot, buffer) in &call.vertex_buffers {
            if let Some(buffer) = self.buffers.get(*buffer) {
                pass.set_vertex_buffer(*slot, buffer.slice(..));
            }
        }
        let Some(indices) = self.buffers.get(call.index_buffer) else {
            log::error!("draw with stale index buffer handle");
            return;
        };
        pass.set_index_buffer(indices.slice(..), call.index_format);
        pass.draw_indexed(0..call.index_count, 0, 0..call.instance_count);
    }

    fn end_frame(&mut self) -> Result<()> {
        let OpenFrame { pass, frame } = self
            .open
            .take()
            .ok_or_else(|| RenderError::Backend("end_frame without an open frame".into()))?;

        drop(pass);
        self.gpu.present(frame);
        Ok(())
    }
}
