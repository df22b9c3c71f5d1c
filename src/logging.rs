//! Tracing subscriber setup

use crate::config::LogTarget;
use crate::error::{AppError, AppResult};
use std::fs::File;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the background log writer alive; drop it last
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber for the chosen target
pub fn init(target: &LogTarget, level: LevelFilter) -> AppResult<LogGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (stderr_layer, file_layer, guard) = match target {
        LogTarget::Disabled => return Ok(LogGuard { _guard: None }),
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter);
            (Some(layer), None, None)
        }
        LogTarget::File(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::Logging(format!("Failed to create log file {:?}: {}", path, e)))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (None, Some(layer), Some(guard))
        }
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing::debug!(?target, %level, "logging initialized");
    Ok(LogGuard { _guard: guard })
}
