//! Render context abstraction for the aquarium.
//!
//! A [`Context`] owns one [`RenderBackend`] and mediates every GPU object the
//! scene creates: buffers, textures, shader programs, bind-group layouts,
//! pipelines. Model renderers ([`model`]) build their pipelines through it at
//! `init` and replay recorded [`DrawCall`]s each frame.
//!
//! Frame protocol:
//! - `pre_frame` acquires the drawable and opens the single render pass
//! - models `update_per_instance_uniforms` and `draw`
//! - `flush` ends the pass, submits and presents
//!
//! Two backends ship: [`WgpuBackend`] drives a real device, [`HeadlessBackend`]
//! records everything on the CPU for tests and offscreen runs.

pub mod backend;
mod binding;
mod context;
mod draw;
mod error;
pub mod model;
mod pipeline;
mod program;
mod resources;
pub mod scene;
mod selector;
mod types;

pub use backend::{FrameRecord, HeadlessBackend, RenderBackend, WgpuBackend};
pub use binding::{
    BindGroupLayoutDesc, BindingEntry, BindingKind, BindingResource, BindingSpec, ViewDimension,
};
pub use context::{Context, ContextState, GlobalResources};
pub use draw::{ClearValues, DrawCall};
pub use error::{RenderError, Result};
pub use model::{InstanceUniforms, Model, ModelGroup, ModelName};
pub use pipeline::{InputState, PipelineState, VertexAttribute, VertexInput, blend_state};
pub use program::{
    DirShaderLibrary, MemoryShaderLibrary, Program, ShaderLibrary, ShaderModule, ShaderStage,
    check_wgsl,
};
pub use resources::{Buffer, ElementLayout, ElementType, SamplerDesc, Texture, TextureSource};
pub use scene::{ResourceMap, SceneState, ViewUniforms};
pub use selector::BackendSelector;
pub use types::{
    BindGroupId, BindGroupLayoutId, BufferId, PipelineId, PipelineLayoutId, SamplerId,
    ShaderModuleId, TextureId,
};
