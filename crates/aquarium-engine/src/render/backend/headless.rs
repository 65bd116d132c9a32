use slotmap::SlotMap;

use crate::render::binding::{BindGroupLayoutDesc, BindingEntry, ViewDimension};
use crate::render::draw::{ClearValues, DrawCall};
use crate::render::error::{RenderError, Result};
use crate::render::pipeline::{InputState, PipelineDesc, PipelineState};
use crate::render::program::{check_wgsl, ShaderModule, ShaderStage};
use crate::render::resources::{
    SamplerDesc, TextureDesc, buffer_range, check_write_alignment,
};
use crate::render::types::{
    BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId, SamplerId,
    ShaderModuleId, TextureId,
};

use super::RenderBackend;

struct HeadlessBuffer {
    label: String,
    usage: wgpu::BufferUsages,
    data: Vec<u8>,
}

struct HeadlessTexture {
    label: String,
    dimension: ViewDimension,
    width: u32,
    height: u32,
}

struct HeadlessPipeline {
    layout: PipelineLayoutId,
    input_state: InputState,
    state: PipelineState,
}

/// Everything recorded between one `begin_frame` / `end_frame` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub index: u64,
    pub clear: ClearValues,
    pub draws: Vec<DrawCall>,
}

/// CPU-only backend.
///
/// Keeps buffer contents in memory and records draw calls per frame instead
/// of executing them. Used for tests and for headless benchmark runs where no
/// window or adapter exists.
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    surface_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,

    buffers: SlotMap<BufferId, HeadlessBuffer>,
    textures: SlotMap<TextureId, HeadlessTexture>,
    samplers: SlotMap<SamplerId, SamplerDesc>,
    shader_modules: SlotMap<ShaderModuleId, String>,
    bind_group_layouts: SlotMap<BindGroupLayoutId, BindGroupLayoutDesc>,
    pipeline_layouts: SlotMap<PipelineLayoutId, Vec<BindGroupLayoutId>>,
    bind_groups: SlotMap<BindGroupId, (BindGroupLayoutId, Vec<BindingEntry>)>,
    pipelines: SlotMap<PipelineId, HeadlessPipeline>,

    open: Option<FrameRecord>,
    frames: Vec<FrameRecord>,
    keep_frames: usize,
    frame_index: u64,
    /// Acquires that report `FrameUnavailable` before frames open again.
    unavailable: u32,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surface_format: wgpu::TextureFormat::Rgba8Unorm,
            depth_format: wgpu::TextureFormat::Depth24PlusStencil8,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            shader_modules: SlotMap::with_key(),
            bind_group_layouts: SlotMap::with_key(),
            pipeline_layouts: SlotMap::with_key(),
            bind_groups: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            open: None,
            frames: Vec::new(),
            keep_frames: usize::MAX,
            frame_index: 0,
            unavailable: 0,
        }
    }

    /// Bounds how many finished frames are retained (oldest dropped first).
    pub fn with_frame_history(mut self, keep: usize) -> Self {
        self.keep_frames = keep.max(1);
        self
    }

    /// Makes the next `count` calls to `begin_frame` fail with
    /// [`RenderError::FrameUnavailable`], as an out-of-date swapchain would.
    pub fn skip_next_frames(&mut self, count: u32) {
        self.unavailable = count;
    }

    /// Finished frames, oldest first.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.frame_index
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<wgpu::BufferUsages> {
        self.buffers.get(buffer).map(|b| b.usage)
    }

    pub fn buffer_label(&self, buffer: BufferId) -> Option<&str> {
        self.buffers.get(buffer).map(|b| b.label.as_str())
    }

    pub fn texture_label(&self, texture: TextureId) -> Option<&str> {
        self.textures.get(texture).map(|t| t.label.as_str())
    }

    /// View dimension and per-layer size of the uploaded texture.
    pub fn texture_extent(&self, texture: TextureId) -> Option<(ViewDimension, u32, u32)> {
        self.textures
            .get(texture)
            .map(|t| (t.dimension, t.width, t.height))
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_samplers(&self) -> usize {
        self.samplers.len()
    }

    pub fn live_bind_group_layouts(&self) -> usize {
        self.bind_group_layouts.len()
    }

    pub fn live_bind_groups(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn live_pipeline_layouts(&self) -> usize {
        self.pipeline_layouts.len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    pub fn bind_group_layout(&self, layout: BindGroupLayoutId) -> Option<&BindGroupLayoutDesc> {
        self.bind_group_layouts.get(layout)
    }

    pub fn pipeline_layout(&self, layout: PipelineLayoutId) -> Option<&[BindGroupLayoutId]> {
        self.pipeline_layouts.get(layout).map(Vec::as_slice)
    }

    pub fn bind_group_entries(&self, group: BindGroupId) -> Option<&[BindingEntry]> {
        self.bind_groups.get(group).map(|(_, e)| e.as_slice())
    }

    pub fn pipeline_state(&self, pipeline: PipelineId) -> Option<&PipelineState> {
        self.pipelines.get(pipeline).map(|p| &p.state)
    }

    pub fn pipeline_input_state(&self, pipeline: PipelineId) -> Option<&InputState> {
        self.pipelines.get(pipeline).map(|p| &p.input_state)
    }

    pub fn pipeline_layout_of(&self, pipeline: PipelineId) -> Option<PipelineLayoutId> {
        self.pipelines.get(pipeline).map(|p| p.layout)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn depth_format(&self) -> wgpu::TextureFormat {
        self.depth_format
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
    }

    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId> {
        Ok(self.buffers.insert(HeadlessBuffer {
            label: label.to_owned(),
            usage,
            data: vec![0; size as usize],
        }))
    }

    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId> {
        Ok(self.buffers.insert(HeadlessBuffer {
            label: label.to_owned(),
            usage,
            data: contents.to_vec(),
        }))
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let target = self
            .buffers
            .get_mut(buffer)
            .ok_or(RenderError::StaleHandle("buffer"))?;

        check_write_alignment(offset, data.len() as u64)?;
        let range = buffer_range(offset, data.len() as u64, target.data.len() as u64)?;
        target.data[range.start as usize..range.end as usize].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&mut self, buffer: BufferId, offset: u64, size: u64) -> Result<Vec<u8>> {
        let source = self
            .buffers
            .get(buffer)
            .ok_or(RenderError::StaleHandle("buffer"))?;

        let range = buffer_range(offset, size, source.data.len() as u64)?;
        Ok(source.data[range.start as usize..range.end as usize].to_vec())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        Ok(self.textures.insert(HeadlessTexture {
            label: desc.label.to_owned(),
            dimension: desc.dimension,
            width: desc.width,
            height: desc.height,
        }))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture);
    }

    fn create_sampler(&mut self, _label: &str, desc: &SamplerDesc) -> SamplerId {
        self.samplers.insert(*desc)
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

        ShaderModule {
            id: self.shader_modules.insert(label.to_owned()),
            label: label.to_owned(),
            stage,
            valid,
        }
    }

    fn create_bind_group_layout(
        &mut self,
        _label: &str,
        desc: &BindGroupLayoutDesc,
    ) -> Result<BindGroupLayoutId> {
        Ok(self.bind_group_layouts.insert(desc.clone()))
    }

    fn create_pipeline_layout(
        &mut self,
        _label: &str,
        layouts: &[BindGroupLayoutId],
    ) -> Result<PipelineLayoutId> {
        if layouts.iter().any(|l| !self.bind_group_layouts.contains_key(*l)) {
            return Err(RenderError::StaleHandle("bind group layout"));
        }
        Ok(self.pipeline_layouts.insert(layouts.to_vec()))
    }

    fn create_bind_group(
        &mut self,
        _label: &str,
        layout: BindGroupLayoutId,
        entries: &[BindingEntry],
    ) -> Result<BindGroupId> {
        if !self.bind_group_layouts.contains_key(layout) {
            return Err(RenderError::StaleHandle("bind group layout"));
        }
        Ok(self.bind_groups.insert((layout, entries.to_vec())))
    }

    fn create_render_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineId> {
        if !self.pipeline_layouts.contains_key(desc.layout) {
            return Err(RenderError::StaleHandle("pipeline layout"));
        }
        if desc.input_state.wgpu_attributes().is_none() {
            return Err(RenderError::Backend(format!(
                "pipeline `{}`: vertex slots must be dense from 0",
                desc.label
            )));
        }

        Ok(self.pipelines.insert(HeadlessPipeline {
            layout: desc.layout,
            input_state: desc.input_state.clone(),
            state: desc.state,
        }))
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
        if self.unavailable > 0 {
            self.unavailable -= 1;
            return Err(RenderError::FrameUnavailable);
        }
        self.open = Some(FrameRecord {
            index: self.frame_index,
            clear: *clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) {
        if let Some(frame) = self.open.as_mut() {
            frame.draws.push(call.clone());
        }
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self
            .open
            .take()
            .ok_or_else(|| RenderError::Backend("end_frame without an open frame".into()))?;

        if self.frames.len() >= self.keep_frames {
            self.frames.remove(0);
        }
        self.frames.push(frame);
        self.frame_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_writes_round_trip() {
        let mut backend = HeadlessBackend::default();
        let id = backend
            .create_buffer("ubo", 32, wgpu::BufferUsages::UNIFORM)
            .unwrap();

        backend.write_buffer(id, 8, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.read_buffer(id, 8, 4).unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(
            backend.read_buffer(id, 30, 4),
            Err(RenderError::BufferRange { end: 34, size: 32, .. })
        ));
    }

    #[test]
    fn rejected_writes_leave_the_buffer_untouched() {
        let mut backend = HeadlessBackend::default();
        let id = backend
            .create_buffer_init("ubo", &[9; 8], wgpu::BufferUsages::UNIFORM)
            .unwrap();

        assert!(matches!(
            backend.write_buffer(id, 4, &[0; 8]),
            Err(RenderError::BufferRange { end: 12, size: 8, .. })
        ));
        assert!(matches!(
            backend.write_buffer(id, 2, &[0; 4]),
            Err(RenderError::UnalignedWrite { offset: 2, .. })
        ));
        assert!(matches!(
            backend.write_buffer(id, 0, &[0; 2]),
            Err(RenderError::UnalignedWrite { len: 2, .. })
        ));
        assert!(matches!(
            backend.write_buffer(id, u64::MAX - 3, &[0; 4]),
            Err(RenderError::RangeOverflow { .. })
        ));
        assert!(matches!(
            backend.read_buffer(id, 4, u64::MAX),
            Err(RenderError::RangeOverflow { .. })
        ));
        assert_eq!(backend.buffer_contents(id), Some(&[9u8; 8][..]));
    }

    #[test]
    fn skipped_acquires_open_no_frame() {
        let mut backend = HeadlessBackend::default();
        backend.skip_next_frames(1);

        assert!(matches!(
            backend.begin_frame(&ClearValues::default()),
            Err(RenderError::FrameUnavailable)
        ));
        assert!(backend.end_frame().is_err());

        backend.begin_frame(&ClearValues::default()).unwrap();
        backend.end_frame().unwrap();
        assert_eq!(backend.presented(), 1);
        assert_eq!(backend.frames()[0].index, 0);
    }

    #[test]
    fn frame_history_is_bounded() {
        let mut backend = HeadlessBackend::default().with_frame_history(2);
        for _ in 0..3 {
            backend.begin_frame(&ClearValues::default()).unwrap();
            backend.end_frame().unwrap();
        }

        assert_eq!(backend.presented(), 3);
        let kept: Vec<u64> = backend.frames().iter().map(|f| f.index).collect();
        assert_eq!(kept, vec![1, 2]);
    }
}
