//! Core engine-facing contracts.
//!
//! This module defines the interface between a frame driver (the winit
//! runtime, or the fixed-count headless loop) and the scene code.

mod app;
mod ctx;
mod headless;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use headless::run_frames;
