//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame.
//! `FrameTime::elapsed` is the monotonically increasing scene clock that
//! animated models (seaweed sway, fish tails) are phased against.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
