use anyhow::{Context as _, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::{Context, RenderBackend, WgpuBackend};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Escape requests a close, like the window's close button.
    pub quit_on_escape: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Aquarium".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            quit_on_escape: true,
        }
    }
}

/// Entry point for the windowed frame loop.
pub struct Runtime;

impl Runtime {
    /// Opens one window, builds a wgpu render context on it and drives `app`
    /// until the window is closed.
    pub fn run<A: App>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    render: Context<WgpuBackend<'this>>,
}

fn create_context<'w>(window: &'w Window, init: &GpuInit) -> Result<Context<WgpuBackend<'w>>> {
    let gpu = pollster::block_on(Gpu::new(window, init))?;
    Ok(Context::new(WgpuBackend::new(gpu)))
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    /// Set once a close has been requested; the loop exits on the next pump.
    should_quit: bool,
    failure: Option<anyhow::Error>,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            should_quit: false,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            render_builder: |w| create_context(w, &gpu_init),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let app = &mut self.app;
        entry
            .with_render_mut(|render| app.on_start(render))
            .context("scene setup failed")?;

        entry.with_mut(|fields| fields.clock.reset());
        self.window = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.request_quit(event_loop);
    }

    /// Tears the window down once: app cleanup, then context termination.
    fn request_quit(&mut self, event_loop: &ActiveEventLoop) {
        self.should_quit = true;
        if let Some(mut entry) = self.window.take() {
            let app = &mut self.app;
            entry.with_render_mut(|render| {
                app.on_exit(render);
                render.terminate();
            });
        }
        event_loop.exit();
    }

    fn set_title(&self, title: &str) {
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.set_title(title));
        }
    }
}

fn is_escape_press(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.should_quit {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(()) => {
                let backend = self
                    .window
                    .as_ref()
                    .map(|e| e.borrow_render().backend().name().to_string())
                    .unwrap_or_default();
                self.set_title(&format!("{} ({backend})", self.config.title));
                if let Some(entry) = &self.window {
                    entry.with_window(|w| w.request_redraw());
                }
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_quit {
            event_loop.exit();
            return;
        }

        // Continuous redraw: the scene animates every frame.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.should_quit {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_quit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.request_quit(event_loop),

            WindowEvent::KeyboardInput { event: key, .. }
                if self.config.quit_on_escape && is_escape_press(key) =>
            {
                log::info!("escape pressed, closing");
                self.request_quit(event_loop);
            }

            WindowEvent::Resized(size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_render_mut(|render| render.resize(size.width, size.height));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let size = entry.with_window(|w| w.inner_size());
                    entry.with_render_mut(|render| render.resize(size.width, size.height));
                }
            }

            WindowEvent::RedrawRequested => {
                let Some(entry) = self.window.as_mut() else {
                    return;
                };

                let app = &mut self.app;
                let control = entry.with_mut(|fields| {
                    let time = fields.clock.tick();
                    fields.window.pre_present_notify();
                    app.on_frame(&mut FrameCtx::new(fields.render, time))
                });

                if control == AppControl::Exit {
                    self.request_quit(event_loop);
                }
            }

            _ => {}
        }
    }
}
