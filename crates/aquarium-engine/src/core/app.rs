use winit::event::WindowEvent;

use crate::render::{Context, RenderBackend};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the scene driver.
///
/// Callbacks are generic over the backend so one scene runs both in a window
/// and headless.
pub trait App {
    /// Called once after the render context exists; create resources and
    /// `init` models here.
    fn on_start<B: RenderBackend>(&mut self, render: &mut Context<B>) -> anyhow::Result<()>;

    /// Called once per frame.
    fn on_frame<B: RenderBackend>(&mut self, frame: &mut FrameCtx<'_, B>) -> AppControl;

    /// Called for window events the runtime does not consume itself.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called before the context is terminated; release model buffers here.
    fn on_exit<B: RenderBackend>(&mut self, render: &mut Context<B>) {
        let _ = render;
    }
}
