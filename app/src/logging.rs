use std::error::Error;
use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber, writing to `log_file`.
///
/// The terminal belongs to the TUI, so nothing is logged to stdout. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(default_filter: &str, log_file: &Path) -> Result<WorkerGuard, Box<dyn Error>> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), default_filter)?;
    let (writer, guard) = file_writer(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()?;

    tracing::info!(log_file = %log_file.display(), "logging initialized");
    Ok(guard)
}

/// `RUST_LOG` wins over the configured filter when set.
pub fn build_filter(
    rust_log: Option<String>,
    default_filter: &str,
) -> Result<EnvFilter, Box<dyn Error>> {
    let directives = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_filter.to_string());
    Ok(EnvFilter::try_new(directives)?)
}

pub fn file_writer(log_file: &Path) -> Result<(NonBlocking, WorkerGuard), Box<dyn Error>> {
    let directory = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let file_name = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("log file path has no file name: {}", log_file.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;
    Ok(tracing_appender::non_blocking(appender))
}
