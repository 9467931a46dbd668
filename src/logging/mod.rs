// Logging module - tracing subscriber setup
//
// stderr gets human-readable output so stdout stays clean for command
// results. With file logging enabled, a JSON layer writes to rotating files
// through a non-blocking writer.
//
// Precedence: RUST_LOG env var > config file > default

use crate::config::{LogRotation, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is unset: our crate at the configured level,
/// HTTP internals kept at warn
pub fn default_filter(level: &str) -> String {
    format!("lungora_console={level},lungora={level},reqwest=warn,hyper=warn")
}

fn file_appender(dir: &Path, prefix: &str, rotation: LogRotation) -> RollingFileAppender {
    match rotation {
        LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
        LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
        LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
    }
}

/// Install the global subscriber.
///
/// The returned guard must be kept alive for the duration of the program so
/// buffered file output is flushed on exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.level).into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if !config.file_enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.file_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            config.file_dir, e
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    let appender = file_appender(&config.file_dir, &config.file_prefix, config.file_rotation);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}
