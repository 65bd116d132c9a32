use std::path::PathBuf;

use clap::Parser;

/// Aquarium renderer.
#[derive(Parser, Debug)]
#[command(name = "aquarium", about = "Aquarium render benchmark")]
pub struct CliArgs {
    /// Graphics API: auto, vulkan, metal, d3d12, opengl (dawn_* spellings accepted).
    #[arg(long, default_value = "auto")]
    pub backend: String,

    /// Run without a window on the CPU recording backend.
    #[arg(long)]
    pub headless: bool,

    /// Frames to render. In a window, 0 runs until closed.
    #[arg(long, default_value_t = 300)]
    pub frames: u64,

    /// Seaweed blades, split across the two seaweed models.
    #[arg(long, default_value_t = 24)]
    pub seaweed: u32,

    /// Fish, split across the five species.
    #[arg(long, default_value_t = 500)]
    pub fish: u32,

    /// Log filter in env_logger syntax (e.g. "debug", "aquarium_engine=trace").
    #[arg(long)]
    pub log: Option<String>,

    /// Surface width.
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Surface height.
    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Load WGSL sources from this directory instead of the built-in set.
    #[arg(long)]
    pub shaders: Option<PathBuf>,
}
