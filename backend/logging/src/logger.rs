//! Structured Logger
//!
//! Wraps `tracing` with console output, optional JSON formatting, optional
//! daily-rolling NDJSON files, and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global logger.
///
/// `RUST_LOG` wins over `level`. With `log_dir` set, a JSON copy of every
/// event goes to `docintake.log.YYYY-MM-DD` in that directory. Calling this
/// twice is harmless; the second call is ignored.
pub fn init_logger(log_dir: Option<&Path>, level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let json_console = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_ansi(false)
    });
    let plain_console = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
    });

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "docintake.log");
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_console)
        .with(plain_console)
        .with(file_layer)
        .try_init();
}
