//! Headless mode - NDJSON request loop over stdin/stdout
//!
//! The phone-facing web layer is an external collaborator. In headless mode the
//! relay reads one JSON request per line and answers with one JSON response per
//! line, which is enough to drive it from a bridge process or a test script.
//!
//! # Request Format
//!
//! ```json
//! {"client":"192.168.1.20","session":"a1","action":"auth","password":"hunter2"}
//! {"client":"192.168.1.20","session":"a1","action":"send","text":"teh cat"}
//! {"client":"192.168.1.20","session":"a1","action":"undo"}
//! ```
//!
//! # Response Format
//!
//! ```json
//! {"status":"success","authenticated":true}
//! {"status":"success"}
//! {"status":"success","content":"teh cat"}
//! ```

pub mod runner;

pub use runner::run_headless;

use crate::models::RelayRequest;
use crate::state::{OperationLog, RelayEvent};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// One request line: the caller's identity plus a tagged [`RelayRequest`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestEnvelope {
    /// Client identity used for lockout bucketing, e.g. the remote address.
    #[serde(default = "default_client")]
    pub client: String,

    /// Session id. Requests without one share the client's session.
    #[serde(default)]
    pub session: Option<String>,

    #[serde(flatten)]
    pub request: RelayRequest,
}

impl RequestEnvelope {
    /// Key under which the session's authenticated flag is stored.
    pub fn session_key(&self) -> &str {
        self.session.as_deref().unwrap_or(&self.client)
    }
}

fn default_client() -> String {
    "local".to_string()
}

/// Authenticated sessions for the lifetime of the loop.
#[derive(Debug, Default)]
pub struct SessionTable {
    authenticated: HashSet<String>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self, key: &str) -> bool {
        self.authenticated.contains(key)
    }

    pub fn authenticate(&mut self, key: &str) {
        if self.authenticated.insert(key.to_string()) {
            tracing::info!("Session {} authenticated", key);
        }
    }

    pub fn len(&self) -> usize {
        self.authenticated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticated.is_empty()
    }
}

/// Log every operation log change until the channel closes.
pub fn spawn_event_logger(log: &OperationLog) -> JoinHandle<()> {
    let mut rx = log.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(RelayEvent::OperationRecorded { operation }) => {
                    tracing::debug!("Operation slot now holds {}", operation.kind());
                }
                Ok(RelayEvent::OperationUndone {
                    operation,
                    reverted,
                }) => {
                    tracing::debug!(
                        "Operation slot cleared by undo of {} (reverted: {})",
                        operation.kind(),
                        reverted
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_flattens_request() {
        let envelope: RequestEnvelope = serde_json::from_str(
            r#"{"client":"10.0.0.5","session":"s1","action":"send","text":"hi"}"#,
        )
        .unwrap();

        assert_eq!(envelope.client, "10.0.0.5");
        assert_eq!(envelope.session_key(), "s1");
        assert_eq!(envelope.request, RelayRequest::Send { text: "hi".into() });
    }

    #[test]
    fn test_envelope_defaults() {
        let envelope: RequestEnvelope = serde_json::from_str(r#"{"action":"health"}"#).unwrap();
        assert_eq!(envelope.client, "local");
        assert_eq!(envelope.session_key(), "local");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = serde_json::from_str::<RequestEnvelope>(r#"{"action":"format_disk"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_table() {
        let mut sessions = SessionTable::new();
        assert!(sessions.is_empty());

        sessions.authenticate("s1");
        sessions.authenticate("s1");
        assert!(sessions.is_authenticated("s1"));
        assert!(!sessions.is_authenticated("s2"));
        assert_eq!(sessions.len(), 1);
    }
}
