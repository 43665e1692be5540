//! Tracing subscriber setup

use crate::config::LoggingConfig;
use anyhow::Context;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Keeps the non-blocking file writer flushing. Hold it for the life of the
/// process; dropping it flushes and stops file output.
#[must_use]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber: console output (JSON or human-readable)
/// plus an optional rolling JSON log file. `RUST_LOG` overrides `config.level`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level '{}'", config.level))?,
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    layers.push(if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    });

    let file_guard = if config.file_enabled {
        std::fs::create_dir_all(&config.file_directory).with_context(|| {
            format!("Failed to create log directory {}", config.file_directory)
        })?;

        let appender = match config.file_rotation.as_str() {
            "hourly" => rolling::hourly(&config.file_directory, &config.file_prefix),
            "minutely" => rolling::minutely(&config.file_directory, &config.file_prefix),
            "never" => rolling::never(&config.file_directory, &config.file_prefix),
            _ => rolling::daily(&config.file_directory, &config.file_prefix),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        service_name = config.service_name,
        environment = config.deployment_environment,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
