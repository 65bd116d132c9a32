use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "aquarium_engine=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Suppresses the wgpu/naga chatter below `warn` unless the filter names them.
    pub quiet_wgpu: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            quiet_wgpu: true,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Filter resolution: explicit `env_filter`, then `RUST_LOG`, then `info`.
/// Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.filter_level(log::LevelFilter::Info);
        if config.quiet_wgpu {
            for noisy in ["wgpu_core", "wgpu_hal", "naga"] {
                builder.filter_module(noisy, log::LevelFilter::Warn);
            }
        }

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        }

        builder.write_style(config.write_style);

        // `try_init` so a test harness that already installed a logger does not panic.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}
