// KeyRelay - relay phone keyboard input to the focused application on a desktop host
//
// This is the library crate containing the relay engine and its data structures.
// The binary crate (main.rs) provides the headless entry point.

pub mod config;
pub mod error;
pub mod headless;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use error::RelayError;
pub use metrics::RelayMetrics;
pub use models::{ClientContext, Operation, RelayConfig, RelayRequest, RelayResponse};
pub use services::{InputInjector, RelayService};
pub use state::{OperationLog, RelayEvent};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
