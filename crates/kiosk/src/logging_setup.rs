//! Tracing subscriber installation
//!
//! Console output goes to stderr. File output goes to one timestamped file per
//! run inside `LogConfig::log_path`, written from a background thread.

use anyhow::{Context, Result};
use kiosk_core::LogConfig;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes the log file when dropped; hold it until `main` returns
pub struct LogGuard {
    _writer: WorkerGuard,
}

/// Install the global subscriber described by `config`
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    let mut config = config.clone();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(level_filter(&config))
                .boxed(),
        );
    }

    let mut guard = None;
    let mut session_log = None;
    if config.file_output {
        let (path, file) = open_session_log(&mut config)?;
        let (writer, worker) = tracing_appender::non_blocking(file);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(level_filter(&config))
                .boxed(),
        );
        guard = Some(LogGuard { _writer: worker });
        session_log = Some(path);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!("Log level: {}", config.level);
    if let Some(path) = session_log {
        info!("Writing log to {}", path.display());
    }

    Ok(guard)
}

/// `RUST_LOG` when set, otherwise the configured level
fn level_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy()
}

/// Create this run's log file, then prune older ones
///
/// The new file counts towards `max_files`.
fn open_session_log(config: &mut LogConfig) -> Result<(PathBuf, File)> {
    config
        .ensure_log_directory()
        .with_context(|| format!("Failed to create log directory {}", config.log_path.display()))?;

    let path = config.pin_session_file();
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    // The subscriber is not installed yet
    match config.cleanup_old_logs() {
        Ok(0) => {}
        Ok(removed) => eprintln!("Pruned {} old log file(s)", removed),
        Err(e) => eprintln!(
            "Warning: could not prune logs in {}: {}",
            config.log_path.display(),
            e
        ),
    }

    Ok((path, file))
}
