//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::config::LoggingConfig;

/// Initialize the logging system from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Initialize logging with a fixed level filter
pub fn init_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new().filter_level(level).try_init();
}

/// Initialize logging from the `[logging]` section of a scene config.
///
/// The level string uses `env_logger` filter syntax, so `"scene_core=trace,info"` works.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = env_logger::Builder::new()
        .parse_filters(&config.level)
        .try_init();
}
