//! Logging utilities

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system
///
/// `default_level` applies when `RUST_LOG` is unset; `RUST_LOG` always wins.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init(default_level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
