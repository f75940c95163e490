//! Logging setup
//!
//! The terminal belongs to the TUI, so the binary logs to a file only:
//! `<tmp>/structed-logs/structed.log`, filtered by `RUST_LOG` or the configured
//! level.

use eyre::Result;
use std::{env, fs, path::PathBuf, sync::Once};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "structed.log";

/// Directory the log file is written to
pub fn log_dir() -> PathBuf {
    env::temp_dir().join("structed-logs")
}

/// Start file logging. Keep the guard alive until exit or buffered lines are lost.
pub fn init_file_logging(default_level: &str) -> Result<(PathBuf, WorkerGuard)> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .or_else(|_| EnvFilter::try_new("info"))?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))?;

    let path = dir.join(LOG_FILE);
    tracing::info!(path = %path.display(), "logging initialized");
    Ok((path, guard))
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Console logging for tests; safe to call from every test
pub fn ensure_test_logging() {
    TEST_LOGGING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        // Another subscriber already installed is fine
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .compact()
            .try_init();
    });
}
