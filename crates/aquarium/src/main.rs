mod cli;
mod mesh;
mod scene;
mod shaders;
mod textures;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use winit::dpi::LogicalSize;

use aquarium_engine::core::run_frames;
use aquarium_engine::device::GpuInit;
use aquarium_engine::logging::{LoggingConfig, init_logging};
use aquarium_engine::render::{BackendSelector, Context, HeadlessBackend};
use aquarium_engine::window::{Runtime, RuntimeConfig};

use crate::cli::CliArgs;
use crate::scene::{AquariumScene, SceneConfig};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let selector: BackendSelector = args.backend.parse()?;
    log::info!("backend: {selector}");

    let config = SceneConfig {
        seaweed: args.seaweed,
        fish: args.fish,
        shaders: args.shaders.clone(),
        max_frames: (!args.headless && args.frames > 0).then_some(args.frames),
    };
    let mut scene = AquariumScene::new(config);

    if args.headless {
        let backend = HeadlessBackend::new(args.width, args.height).with_frame_history(4);
        let mut ctx = Context::new(backend);
        let ran = run_frames(&mut scene, &mut ctx, args.frames, Duration::from_millis(16))?;

        let draws = ctx.backend().last_frame().map_or(0, |f| f.draws.len());
        log::info!(
            "headless: {ran} frames, {} presented, {draws} draws in the last frame",
            ctx.backend().presented(),
        );
        return Ok(());
    }

    let runtime = RuntimeConfig {
        initial_size: LogicalSize::new(args.width as f64, args.height as f64),
        ..Default::default()
    };
    let gpu = GpuInit {
        backends: selector.backends(),
        ..Default::default()
    };
    Runtime::run(runtime, gpu, scene)
}
