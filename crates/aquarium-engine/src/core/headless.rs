use std::time::Duration;

use anyhow::Result;

use crate::render::{Context, RenderBackend};
use crate::time::FrameClock;

use super::app::{App, AppControl};
use super::ctx::FrameCtx;

/// Drives `app` for at most `frames` frames on a fixed clock step, then
/// terminates the context.
///
/// Returns the number of frames the app ran before finishing.
pub fn run_frames<A, B>(
    app: &mut A,
    render: &mut Context<B>,
    frames: u64,
    step: Duration,
) -> Result<u64>
where
    A: App,
    B: RenderBackend,
{
    app.on_start(render)?;

    let mut clock = FrameClock::new();
    let mut ran = 0;
    while ran < frames {
        let time = clock.tick_fixed(step);
        let control = app.on_frame(&mut FrameCtx::new(render, time));
        ran += 1;
        if control == AppControl::Exit {
            log::info!("app requested exit after {ran} frames");
            break;
        }
    }

    app.on_exit(render);
    render.terminate();
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ContextState, HeadlessBackend};

    #[derive(Default)]
    struct Counting {
        started: bool,
        frames: u64,
        exit_at: Option<u64>,
        exited: bool,
    }

    impl App for Counting {
        fn on_start<B: RenderBackend>(&mut self, _: &mut Context<B>) -> Result<()> {
            self.started = true;
            Ok(())
        }

        fn on_frame<B: RenderBackend>(&mut self, frame: &mut FrameCtx<'_, B>) -> AppControl {
            self.frames += 1;
            let control = frame.draw_frame(|_, _| Ok(()));
            if self.exit_at == Some(self.frames) {
                AppControl::Exit
            } else {
                control
            }
        }

        fn on_exit<B: RenderBackend>(&mut self, _: &mut Context<B>) {
            self.exited = true;
        }
    }

    #[test]
    fn runs_the_requested_frame_count() {
        let mut app = Counting::default();
        let mut ctx = Context::new(HeadlessBackend::new(32, 32));

        let ran = run_frames(&mut app, &mut ctx, 5, Duration::from_millis(16)).unwrap();

        assert_eq!(ran, 5);
        assert!(app.started && app.exited);
        assert_eq!(ctx.frame_count(), 5);
        assert_eq!(ctx.backend().frames().len(), 5);
        assert_eq!(ctx.state(), ContextState::Terminated);
    }

    #[test]
    fn stops_early_on_exit() {
        let mut app = Counting {
            exit_at: Some(2),
            ..Default::default()
        };
        let mut ctx = Context::new(HeadlessBackend::new(32, 32));

        let ran = run_frames(&mut app, &mut ctx, 10, Duration::from_millis(16)).unwrap();
        assert_eq!(ran, 2);
    }
}
