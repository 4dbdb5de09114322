//! Tracing subscriber setup
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LoggingConfig::level`]. Output is human-readable on stderr unless
//! `json` is enabled. When `directory` is set, a daily-rolling file sink is
//! added and its [`WorkerGuard`] must be held until shutdown.

use std::path::Path;

use deskpulse_domain::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "deskpulse.log";

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns the file writer guard when file logging is enabled. Calling this
/// twice is harmless: the second install is ignored.
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = build_filter(config);

    let stderr_layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let (writer, guard) = file_writer(Path::new(directory));
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed =
        tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    guard
}

fn file_writer(directory: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    tracing_appender::non_blocking(appender)
}
