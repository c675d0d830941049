//! Caller-facing error type for relay operations.
//!
//! `RelayError` is returned by every [`RelayService`](crate::services::RelayService)
//! operation. None of these abort the process; the dispatch layer turns each one
//! into a structured `status` + `msg` response.

use crate::services::injector::InjectorError;
use thiserror::Error;

/// Errors surfaced by the relay engine.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Undo was requested while the operation slot is empty.
    #[error("No operation to undo")]
    NoHistory,

    /// The client identity is inside an active lockout window.
    #[error("Too many attempts, retry in {remaining_secs}s")]
    LockedOut { remaining_secs: u64 },

    /// Wrong password, the identity still has attempts left.
    #[error("Wrong password, {remaining_attempts} attempts left")]
    InvalidPassword { remaining_attempts: u32 },

    /// A protected operation was requested by an unauthenticated session.
    #[error("Login required")]
    Unauthorized,

    /// Request parameters were rejected before reaching the injector.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The input injector failed; the operation is treated as not having happened.
    #[error("Injection failed: {0}")]
    Injector(#[from] InjectorError),

    /// Backing files for quick options could not be written.
    #[error("Failed to persist quick options: {0}")]
    Persistence(String),
}

impl RelayError {
    /// Stable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::NoHistory => "NoHistory",
            RelayError::LockedOut { .. } => "LockedOut",
            RelayError::InvalidPassword { .. } => "InvalidPassword",
            RelayError::Unauthorized => "Unauthorized",
            RelayError::InvalidInput(_) => "InvalidInput",
            RelayError::Injector(_) => "Injector",
            RelayError::Persistence(_) => "Persistence",
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain, e.g. "failed to write x: permission denied"
        RelayError::Persistence(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(RelayError::NoHistory.kind(), "NoHistory");
        assert_eq!(RelayError::LockedOut { remaining_secs: 3 }.kind(), "LockedOut");
        assert_eq!(RelayError::Unauthorized.kind(), "Unauthorized");
        assert_eq!(
            RelayError::Injector(InjectorError::UnsupportedKey("f99".into())).kind(),
            "Injector"
        );
    }

    #[test]
    fn test_locked_out_message_has_remaining_secs() {
        let err = RelayError::LockedOut { remaining_secs: 42 };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        let err = anyhow::anyhow!("permission denied").context("Failed to write commands.txt");
        let relay_err: RelayError = err.into();

        assert_eq!(relay_err.kind(), "Persistence");
        let msg = relay_err.to_string();
        assert!(msg.contains("commands.txt"));
        assert!(msg.contains("permission denied"));
    }
}
