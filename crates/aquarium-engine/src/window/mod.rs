//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single aquarium window, and wires them
//! to a wgpu-backed render context.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
