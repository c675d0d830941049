//! KeyRelay - relay phone keyboard input to the focused application
//!
//! Main entry point for the headless relay.
//!
//! # Overview
//!
//! This binary wires the relay engine to stdin/stdout. It initializes:
//! - Configuration ([`ConfigManager`]) from `KeyRelay Data/`
//! - Logging infrastructure (file rotation + stderr console output)
//! - Tokio async runtime (request loop, event logger)
//! - The relay service ([`RelayService`]) with the dry-run injector
//!
//! # Execution Flow
//!
//! 1. Resolve the data directory (`KEYRELAY_DATA_DIR` or `KeyRelay Data`)
//! 2. Write a default `Relay Config.yaml` if none exists, then load it
//! 3. Initialize logging → `<logging.dir>/keyrelay.<date>`
//! 4. Load rewrite rules and quick options, build the service
//! 5. Serve NDJSON requests from stdin until it closes
//! 6. Log the metrics summary and shut down
//!
//! # Data Directory
//!
//! - `Relay Config.yaml`: auth, file names, logging
//! - `hot-rule.txt`: rewrite rules (`pattern = replacement`, one per line)
//! - `commands.txt`, `phrases.txt`: quick options

use anyhow::{Context, Result};
use keyrelay::headless::{run_headless, spawn_event_logger};
use keyrelay::services::DryRunInjector;
use keyrelay::{APP_NAME, ConfigManager, RelayService, VERSION};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

const DEFAULT_DATA_DIR: &str = "KeyRelay Data";
const DATA_DIR_ENV: &str = "KEYRELAY_DATA_DIR";

fn main() -> Result<()> {
    let data_dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());

    let config_manager = ConfigManager::new(&data_dir)?;
    let created = config_manager.ensure_config()?;
    let config = config_manager.load_config()?;

    let log_settings = {
        let mut settings = config.logging.clone();
        settings.dir = config_manager.resolve(&settings.dir).into_string();
        settings
    };
    let _guard = keyrelay::logging::setup_logging_from_settings(&log_settings, APP_NAME)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if created {
        tracing::info!("Wrote default config to {}", config_manager.config_path());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("keyrelay-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    // No OS backend is linked into this binary; actions are logged only
    let injector = Arc::new(DryRunInjector::logging_only());
    let service = Arc::new(RelayService::from_config(&config_manager, &config, injector)?);

    tracing::info!(
        "Relay ready: {} rewrite rules, auth {}",
        service.rules().len(),
        if service.auth_enabled() { "enabled" } else { "disabled" }
    );

    let result = runtime.block_on(async {
        let event_logger = spawn_event_logger(service.log());

        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        let answered = run_headless(Arc::clone(&service), stdin, stdout).await;

        event_logger.abort();
        answered
    });

    service.metrics().log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    let answered = result?;
    tracing::info!("Shutdown complete after {} requests", answered);
    Ok(())
}
