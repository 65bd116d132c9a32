use crate::render::{Context, RenderBackend, RenderError};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a, B: RenderBackend> {
    pub render: &'a mut Context<B>,
    pub time: FrameTime,
}

impl<'a, B: RenderBackend> FrameCtx<'a, B> {
    pub fn new(render: &'a mut Context<B>, time: FrameTime) -> Self {
        Self { render, time }
    }

    /// Scene clock in seconds.
    pub fn clock(&self) -> f32 {
        self.time.elapsed
    }

    /// Opens the frame, calls `draw`, then flushes and presents.
    ///
    /// An unavailable drawable skips the frame. Draw errors are logged and the
    /// frame is still flushed; any other failure ends the run.
    pub fn draw_frame<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut Context<B>, FrameTime) -> crate::render::Result<()>,
    {
        match self.render.pre_frame() {
            Ok(()) => {}
            Err(RenderError::FrameUnavailable) => {
                log::debug!("frame {} skipped: drawable unavailable", self.time.frame_index);
                return AppControl::Continue;
            }
            Err(err) => {
                log::error!("cannot begin frame: {err}");
                return AppControl::Exit;
            }
        }

        if let Err(err) = draw(&mut *self.render, self.time) {
            log::error!("frame {}: {err}", self.time.frame_index);
        }

        match self.render.flush() {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                log::error!("cannot present frame: {err}");
                AppControl::Exit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ContextState, HeadlessBackend};
    use crate::time::FrameClock;
    use std::time::Duration;

    #[test]
    fn draw_frame_brackets_a_frame() {
        let mut ctx = Context::new(HeadlessBackend::new(64, 64));
        let time = FrameClock::new().tick_fixed(Duration::from_millis(16));

        let mut frame = FrameCtx::new(&mut ctx, time);
        let mut seen = None;
        let control = frame.draw_frame(|render, _| {
            seen = Some(render.state());
            Ok(())
        });

        assert_eq!(control, AppControl::Continue);
        assert_eq!(seen, Some(ContextState::FrameOpen));
        assert_eq!(ctx.state(), ContextState::Ready);
        assert_eq!(ctx.frame_count(), 1);
    }

    #[test]
    fn terminated_context_ends_the_run() {
        let mut ctx = Context::new(HeadlessBackend::new(64, 64));
        ctx.terminate();
        let time = FrameClock::new().tick_fixed(Duration::from_millis(16));

        let control = FrameCtx::new(&mut ctx, time).draw_frame(|_, _| Ok(()));
        assert_eq!(control, AppControl::Exit);
    }
}
