//! Services module - the relay engine.
//!
//! Everything here is transport-agnostic: no stdin, sockets or HTTP, only the
//! logic that turns a request into host input and a structured response.
//!
//! # Components
//!
//! - [`RuleStore`]: ordered rewrite rules applied to outbound text
//! - [`QuickOptionsStore`]: saved commands and phrases with atomic save
//! - [`AuthGuard`]: per-client failure counter with time-boxed lockout
//! - [`InputInjector`]: the host injection capability, with [`DryRunInjector`]
//! - [`RelayService`]: orchestration, the only component that mutates across subsystems
//! - [`handle_request`]: request → service call → [`RelayResponse`](crate::models::RelayResponse)
//!
//! # Usage Example
//!
//! ```ignore
//! use keyrelay::services::{handle_request, RelayService};
//! use keyrelay::models::{ClientContext, RelayRequest};
//!
//! let service = RelayService::from_config(&manager, &config, injector)?;
//! let client = ClientContext::new("192.168.1.20", false);
//!
//! let response = handle_request(&service, &client, RelayRequest::Auth {
//!     password: "hunter2".into(),
//! });
//! ```

pub mod auth;
pub mod dispatch;
pub mod injector;
pub mod quick_options;
pub mod relay;
pub mod rules;

pub use auth::{AttemptState, AuthGuard, AuthOutcome, LoginAttempt, MAX_LOCKOUT};
pub use dispatch::handle_request;
pub use injector::{DryRunInjector, InjectedAction, InjectorError, InputInjector};
pub use quick_options::QuickOptionsStore;
pub use relay::RelayService;
pub use rules::{RewriteRule, RuleError, RuleStore};
