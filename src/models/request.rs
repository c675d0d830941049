use crate::error::RelayError;
use serde::{Deserialize, Serialize};

/// Who is calling, as reported by the surrounding session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Stable per-client identity used for lockout bucketing (e.g. remote address).
    pub identity: String,

    /// Whether the caller's session has already passed authentication.
    pub authenticated: bool,
}

impl ClientContext {
    pub fn new(identity: impl Into<String>, authenticated: bool) -> Self {
        Self {
            identity: identity.into(),
            authenticated,
        }
    }
}

/// One inbound relay request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelayRequest {
    Auth {
        #[serde(default)]
        password: String,
    },
    Health,
    GetOptions,
    SaveOptions {
        #[serde(default)]
        commands: Vec<String>,
        #[serde(default)]
        phrases: Vec<String>,
    },
    ReloadOptions,
    Send {
        #[serde(default)]
        text: String,
    },
    SendEnter,
    SendHotkey {
        #[serde(default)]
        hotkey: String,
    },
    QuickOption {
        option: String,
    },
    MoveCursor {
        #[serde(default)]
        direction: String,
    },
    DeletePc,
    MouseMove {
        #[serde(default)]
        dx: i32,
        #[serde(default)]
        dy: i32,
    },
    MouseClick {
        #[serde(default = "default_button")]
        button: String,
        #[serde(default = "default_clicks")]
        clicks: u32,
    },
    Screenshot,
    Undo,
}

impl RelayRequest {
    /// Requests that are answered without an authenticated session.
    pub fn is_public(&self) -> bool {
        matches!(self, RelayRequest::Auth { .. } | RelayRequest::Health)
    }
}

fn default_button() -> String {
    "left".to_string()
}

fn default_clicks() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Failed,
    Locked,
    Unauthorized,
    Ok,
}

/// Structured outcome of a request: a status, an optional message and
/// request-specific payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    /// Content restored by an undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrases: Option<Vec<String>>,

    /// Base64 encoded screenshot bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl RelayResponse {
    pub fn with_status(status: ResponseStatus) -> Self {
        Self {
            status,
            msg: None,
            content: None,
            authenticated: None,
            commands: None,
            phrases: None,
            image: None,
        }
    }

    pub fn success() -> Self {
        Self::with_status(ResponseStatus::Success)
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(ResponseStatus::Failed).with_msg(msg)
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ResponseStatus::Success | ResponseStatus::Ok)
    }
}

impl From<&RelayError> for RelayResponse {
    fn from(err: &RelayError) -> Self {
        let status = match err {
            RelayError::LockedOut { .. } => ResponseStatus::Locked,
            RelayError::Unauthorized => ResponseStatus::Unauthorized,
            RelayError::NoHistory
            | RelayError::InvalidPassword { .. }
            | RelayError::InvalidInput(_)
            | RelayError::Injector(_)
            | RelayError::Persistence(_) => ResponseStatus::Failed,
        };
        RelayResponse::with_status(status).with_msg(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_requests() {
        let req: RelayRequest =
            serde_json::from_str(r#"{"action":"send","text":"hello"}"#).unwrap();
        assert_eq!(req, RelayRequest::Send { text: "hello".into() });

        let req: RelayRequest = serde_json::from_str(r#"{"action":"undo"}"#).unwrap();
        assert_eq!(req, RelayRequest::Undo);
    }

    #[test]
    fn test_mouse_click_defaults() {
        let req: RelayRequest = serde_json::from_str(r#"{"action":"mouse_click"}"#).unwrap();
        assert_eq!(
            req,
            RelayRequest::MouseClick {
                button: "left".into(),
                clicks: 1
            }
        );
    }

    #[test]
    fn test_public_requests() {
        assert!(RelayRequest::Health.is_public());
        assert!(RelayRequest::Auth { password: String::new() }.is_public());
        assert!(!RelayRequest::Undo.is_public());
    }

    #[test]
    fn test_response_skips_empty_fields() {
        let json = serde_json::to_value(RelayResponse::success()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn test_error_status_mapping() {
        let locked = RelayResponse::from(&RelayError::LockedOut { remaining_secs: 9 });
        assert_eq!(locked.status, ResponseStatus::Locked);

        let no_history = RelayResponse::from(&RelayError::NoHistory);
        assert_eq!(no_history.status, ResponseStatus::Failed);
        assert!(no_history.msg.is_some());
    }
}
