//! Host input injection seam.
//!
//! The relay engine never talks to the OS directly. Everything that makes the host
//! behave as if a key or mouse event happened goes through [`InputInjector`], so
//! the platform backend can be swapped and tests can observe every side effect.

use crate::models::MouseButton;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors reported by an injection backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectorError {
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Capability to inject input into the host's focused window.
///
/// Calls are direct and immediate; no retries are made by the caller.
pub trait InputInjector: Send + Sync {
    /// Insert text at the cursor (backends typically paste through the clipboard).
    fn type_text(&self, text: &str) -> Result<(), InjectorError>;

    fn press_key(&self, key: &str) -> Result<(), InjectorError>;

    /// Hold every key in order, then release them in reverse.
    fn press_chord(&self, keys: &[String]) -> Result<(), InjectorError>;

    /// Issue `count` discrete backward-delete presses.
    fn backspace(&self, count: usize) -> Result<(), InjectorError>;

    fn move_mouse_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError>;

    fn click(&self, button: MouseButton, count: u32) -> Result<(), InjectorError>;

    /// Capture the screen as encoded image bytes.
    fn screenshot(&self) -> Result<Vec<u8>, InjectorError>;
}

/// One action performed by the [`DryRunInjector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedAction {
    Text(String),
    Key(String),
    Chord(Vec<String>),
    Backspace(usize),
    MouseMove { dx: i32, dy: i32 },
    Click { button: MouseButton, count: u32 },
    Screenshot,
}

/// Injector that performs nothing on the host.
///
/// Every action is logged. [`new`](Self::new) also keeps actions in memory for
/// inspection; [`logging_only`](Self::logging_only) keeps nothing, for
/// long-running headless processes without an OS integration.
#[derive(Debug)]
pub struct DryRunInjector {
    actions: Mutex<Vec<InjectedAction>>,
    record: bool,
    screenshot: Option<Vec<u8>>,
}

impl DryRunInjector {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            record: true,
            screenshot: None,
        }
    }

    /// Log actions without retaining them.
    pub fn logging_only() -> Self {
        Self {
            record: false,
            ..Self::new()
        }
    }

    /// Serve `bytes` for every screenshot request.
    pub fn with_screenshot(bytes: Vec<u8>) -> Self {
        Self {
            screenshot: Some(bytes),
            ..Self::new()
        }
    }

    /// Actions recorded so far, oldest first.
    pub fn actions(&self) -> Vec<InjectedAction> {
        self.lock().clone()
    }

    /// Total backspace presses across all recorded actions.
    pub fn backspace_count(&self) -> usize {
        self.lock()
            .iter()
            .map(|action| match action {
                InjectedAction::Backspace(count) => *count,
                _ => 0,
            })
            .sum()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, action: InjectedAction) {
        tracing::info!("dry-run inject: {:?}", action);
        if self.record {
            self.lock().push(action);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<InjectedAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DryRunInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for DryRunInjector {
    fn type_text(&self, text: &str) -> Result<(), InjectorError> {
        self.push(InjectedAction::Text(text.to_string()));
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<(), InjectorError> {
        self.push(InjectedAction::Key(key.to_string()));
        Ok(())
    }

    fn press_chord(&self, keys: &[String]) -> Result<(), InjectorError> {
        self.push(InjectedAction::Chord(keys.to_vec()));
        Ok(())
    }

    fn backspace(&self, count: usize) -> Result<(), InjectorError> {
        self.push(InjectedAction::Backspace(count));
        Ok(())
    }

    fn move_mouse_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError> {
        self.push(InjectedAction::MouseMove { dx, dy });
        Ok(())
    }

    fn click(&self, button: MouseButton, count: u32) -> Result<(), InjectorError> {
        self.push(InjectedAction::Click { button, count });
        Ok(())
    }

    fn screenshot(&self) -> Result<Vec<u8>, InjectorError> {
        self.push(InjectedAction::Screenshot);
        self.screenshot
            .clone()
            .ok_or_else(|| InjectorError::Unavailable("screen capture in dry-run mode".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_records_in_order() {
        let injector = DryRunInjector::new();
        injector.type_text("hi").unwrap();
        injector.press_key("enter").unwrap();
        injector.backspace(3).unwrap();

        assert_eq!(
            injector.actions(),
            vec![
                InjectedAction::Text("hi".into()),
                InjectedAction::Key("enter".into()),
                InjectedAction::Backspace(3),
            ]
        );
        assert_eq!(injector.backspace_count(), 3);
    }

    #[test]
    fn test_dry_run_screenshot_unavailable_by_default() {
        let injector = DryRunInjector::new();
        assert!(matches!(
            injector.screenshot(),
            Err(InjectorError::Unavailable(_))
        ));

        let injector = DryRunInjector::with_screenshot(vec![0xFF, 0xD8]);
        assert_eq!(injector.screenshot().unwrap(), vec![0xFF, 0xD8]);
    }

    #[test]
    fn test_logging_only_retains_nothing() {
        let injector = DryRunInjector::logging_only();
        for _ in 0..100 {
            injector.type_text("x").unwrap();
            injector.backspace(1).unwrap();
        }

        assert!(injector.actions().is_empty());
        assert_eq!(injector.backspace_count(), 0);
    }

    #[test]
    fn test_clear() {
        let injector = DryRunInjector::new();
        injector.backspace(1).unwrap();
        injector.clear();
        assert!(injector.actions().is_empty());
    }
}
