//! Data models for the relay engine.
//!
//! - [`Operation`]: the single undo slot's value, a sum type over the mutating actions
//! - [`QuickOption`]: a saved command or phrase, literal text or a `[KEY]` hotkey directive
//! - [`Hotkey`], [`CursorDirection`], [`MouseButton`]: parsed input parameters
//! - [`RelayConfig`]: settings loaded from `Relay Config.yaml`
//! - [`RelayRequest`], [`RelayResponse`], [`ClientContext`]: the request/response boundary

pub mod config;
pub mod input;
pub mod operation;
pub mod quick_option;
pub mod request;

pub use config::{AuthSettings, FileSettings, LoggingSettings, RelayConfig};
pub use input::{CursorDirection, Hotkey, MouseButton};
pub use operation::Operation;
pub use quick_option::{HOTKEY_PREFIX, QuickOption};
pub use request::{ClientContext, RelayRequest, RelayResponse, ResponseStatus};
