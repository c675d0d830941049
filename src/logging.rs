use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Setup logging from the `logging` section of the relay config.
///
/// Logs are written to `settings.dir` with daily rotation. Console output goes
/// to stderr; stdout is reserved for headless protocol output.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging_from_settings(
    settings: &LoggingSettings,
    log_prefix: &str,
) -> Result<WorkerGuard> {
    ensure_log_dir(&settings.dir)?;

    let file_appender = rolling::daily(&settings.dir, log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = if settings.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if settings.json {
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .boxed(),
        );
    } else {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    }

    if settings.console {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        settings.dir,
        log_prefix,
        settings.debug,
        settings.console,
        settings.json
    );

    Ok(guard)
}

fn ensure_log_dir(log_dir: &str) -> Result<()> {
    let log_path = Utf8PathBuf::from(log_dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}
