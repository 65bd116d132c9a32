use std::path::PathBuf;

use thiserror::Error;

use super::binding::BindingKind;
use super::context::ContextState;

/// Errors raised by the render context and model renderers.
///
/// Most of these are construction-time failures: device setup, layout and
/// bind-group composition, pipeline creation, model `init`. Per frame only
/// state misuse, rejected uniform writes and an unavailable drawable occur.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("context is {actual:?}, operation requires {expected:?}")]
    InvalidState {
        expected: ContextState,
        actual: ContextState,
    },

    #[error("unknown backend `{0}` (expected vulkan, metal, d3d12, opengl or auto)")]
    UnknownBackend(String),

    #[error("general resources have not been initialized")]
    GlobalsMissing,

    #[error("{model} model requires resource `{name}`")]
    MissingResource {
        model: &'static str,
        name: &'static str,
    },

    #[error("bind group supplies {supplied} bindings, layout declares {declared}")]
    BindingCountMismatch { declared: usize, supplied: usize },

    #[error("binding slot {slot} is not declared by the layout")]
    UndeclaredSlot { slot: u32 },

    #[error("binding slot {slot} supplied more than once")]
    DuplicateSlot { slot: u32 },

    #[error("binding slot {slot}: layout declares {expected:?}, got {actual:?}")]
    BindingKindMismatch {
        slot: u32,
        expected: BindingKind,
        actual: BindingKind,
    },

    #[error("bind group at index {index} does not match the pipeline layout")]
    PipelineLayoutMismatch { index: u32 },

    #[error("shader module `{0}` is invalid")]
    InvalidShaderModule(String),

    #[error("shader source `{0}` not found")]
    ShaderSourceNotFound(String),

    #[error("{0} model used before init")]
    ModelNotInitialized(&'static str),

    #[error("{model} model does not take {supplied} instance data")]
    UnexpectedInstanceData {
        model: &'static str,
        supplied: &'static str,
    },

    #[error("per-instance capacity of {capacity} exceeded")]
    InstanceCapacityExceeded { capacity: usize },

    #[error("range {offset}..{end} exceeds buffer size {size}")]
    BufferRange { offset: u64, end: u64, size: u64 },

    #[error("range of {len} bytes at {offset} overflows the address space")]
    RangeOverflow { offset: u64, len: u64 },

    #[error("write of {len} bytes at {offset} is not 4-byte aligned")]
    UnalignedWrite { offset: u64, len: u64 },

    #[error("stale {0} handle")]
    StaleHandle(&'static str),

    #[error("texture `{name}`: {reason}")]
    InvalidTexture { name: String, reason: String },

    #[error("failed to decode image {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("swapchain image unavailable this frame")]
    FrameUnavailable,

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
