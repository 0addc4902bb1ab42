//! Logging infrastructure for Repset.
//!
//! The session view owns stdout, so log output goes to stderr. Levels used
//! across the crate:
//! - `info`: session started, completed or abandoned; config loaded
//! - `warn`: completion report failed or was dropped; unreadable log lines
//! - `debug`: ignored view events (toggle on another exercise, next while
//!   incomplete, rest extend/skip while idle) and timer transitions
//!
//! The default level comes from `[logging] level` in the config file.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at INFO unless `RUST_LOG` says otherwise
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Default log level (trace, debug, info, warn, error)
///
/// `RUST_LOG` still takes precedence. Calling this twice is harmless; the
/// second subscriber is discarded.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Route debug-level session logs into the test harness output
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
