//! Aquarium engine crate.
//!
//! Owns the platform and GPU runtime pieces the aquarium scene is drawn with:
//! device and surface lifecycle, the winit frame loop, frame timing, logging,
//! and the `render` context with its per-kind model renderers.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
