//! Backend capability interface.
//!
//! A backend owns every GPU object and hands out opaque handles. The render
//! context and the model renderers are written only against this trait, so
//! they behave identically on the wgpu device and on the headless recorder.

mod headless;
mod wgpu_backend;

pub use self::headless::{FrameRecord, HeadlessBackend};
pub use self::wgpu_backend::WgpuBackend;

use super::binding::{BindGroupLayoutDesc, BindingEntry};
use super::draw::{ClearValues, DrawCall};
use super::error::Result;
use super::pipeline::PipelineDesc;
use super::program::{ShaderModule, ShaderStage};
use super::resources::{SamplerDesc, TextureDesc};
use super::types::{
    BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId, SamplerId, TextureId,
};

pub trait RenderBackend {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Color format of the presentable images.
    fn surface_format(&self) -> wgpu::TextureFormat;

    /// Format of the context-owned depth-stencil attachment.
    fn depth_format(&self) -> wgpu::TextureFormat;

    /// Current drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the swapchain and depth attachment. Zero sizes are deferred.
    fn resize(&mut self, width: u32, height: u32);

    fn create_buffer(&mut self, label: &str, size: u64, usage: wgpu::BufferUsages)
    -> Result<BufferId>;

    /// Creates a buffer and uploads `contents` before returning.
    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId>;

    /// Overwrites `data.len()` bytes at `offset`. Writes are ordered before
    /// the next submission and after every earlier one.
    ///
    /// Offset and length must both be multiples of 4 and the range must lie
    /// inside the buffer; otherwise nothing is written.
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()>;

    /// Reads back `size` bytes at `offset`, waiting for the GPU if needed.
    fn read_buffer(&mut self, buffer: BufferId, offset: u64, size: u64) -> Result<Vec<u8>>;

    fn destroy_buffer(&mut self, buffer: BufferId);

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    fn create_sampler(&mut self, label: &str, desc: &SamplerDesc) -> SamplerId;

    fn destroy_sampler(&mut self, sampler: SamplerId);

    /// Compiles a module. Failure is reported through `ShaderModule::valid`,
    /// never as an error.
    fn create_shader_module(&mut self, label: &str, stage: ShaderStage, source: &str)
    -> ShaderModule;

    fn create_bind_group_layout(
        &mut self,
        label: &str,
        desc: &BindGroupLayoutDesc,
    ) -> Result<BindGroupLayoutId>;

    fn create_pipeline_layout(
        &mut self,
        label: &str,
        layouts: &[BindGroupLayoutId],
    ) -> Result<PipelineLayoutId>;

    /// `entries` have already been validated against the layout.
    fn create_bind_group(
        &mut self,
        label: &str,
        layout: BindGroupLayoutId,
        entries: &[BindingEntry],
    ) -> Result<BindGroupId>;

    fn create_render_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineId>;

    // Releasing a layout does not invalidate groups or pipelines built from
    // it; callers destroy those first.
    fn destroy_bind_group(&mut self, group: BindGroupId);

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutId);

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutId);

    fn destroy_pipeline(&mut self, pipeline: PipelineId);

    /// Acquires the next presentable image and opens the frame pass.
    fn begin_frame(&mut self, clear: &ClearValues) -> Result<()>;

    /// Appends one draw to the open pass.
    fn draw(&mut self, call: &DrawCall);

    /// Ends the pass, submits, presents.
    fn end_frame(&mut self) -> Result<()>;
}
