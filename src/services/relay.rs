use crate::config::ConfigManager;
use crate::error::RelayError;
use crate::metrics::RelayMetrics;
use crate::models::{CursorDirection, Hotkey, MouseButton, Operation, QuickOption, RelayConfig};
use crate::services::auth::{AuthGuard, AuthOutcome};
use crate::services::injector::{InjectorError, InputInjector};
use crate::services::quick_options::QuickOptionsStore;
use crate::services::rules::RuleStore;
use crate::state::OperationLog;
use anyhow::Result;
use std::sync::Arc;

/// Orchestrates rewrite rules, quick options, the login guard, the operation
/// log and the injector for every inbound request.
///
/// Mutating calls inject first and record the [`Operation`] only once the
/// injector confirmed success, so undo never reverses an action that did not
/// happen.
///
/// # Example
/// ```ignore
/// let service = RelayService::new(
///     RuleStore::parse("teh = the"),
///     QuickOptionsStore::new("commands.txt", "phrases.txt"),
///     AuthGuard::disabled(),
///     Arc::new(DryRunInjector::new()),
/// );
/// service.send_text("teh cat")?;   // injects "the cat"
/// let restored = service.undo()?;  // 7 backspaces, returns "teh cat"
/// ```
pub struct RelayService {
    rules: RuleStore,
    options: QuickOptionsStore,
    auth: AuthGuard,
    log: OperationLog,
    injector: Arc<dyn InputInjector>,
    metrics: Arc<RelayMetrics>,
}

impl RelayService {
    pub fn new(
        rules: RuleStore,
        options: QuickOptionsStore,
        auth: AuthGuard,
        injector: Arc<dyn InputInjector>,
    ) -> Self {
        Self {
            rules,
            options,
            auth,
            log: OperationLog::new(),
            injector,
            metrics: Arc::new(RelayMetrics::new()),
        }
    }

    /// Build a service from the data directory and loaded configuration.
    pub fn from_config(
        manager: &ConfigManager,
        config: &RelayConfig,
        injector: Arc<dyn InputInjector>,
    ) -> Result<Self> {
        let rules = RuleStore::load(&manager.rules_path(config))?;
        let options =
            QuickOptionsStore::load(manager.commands_path(config), manager.phrases_path(config))?;
        let auth = AuthGuard::new(
            config.auth.effective_password().map(str::to_string),
            config.auth.max_attempts,
            config.auth.lockout_duration(),
        );

        Ok(Self::new(rules, options, auth, injector))
    }

    // Text and keys

    /// Inject `raw` after rewrite rules. Whitespace-only input is a no-op.
    pub fn send_text(&self, raw: &str) -> Result<(), RelayError> {
        let text = raw.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring empty text");
            return Ok(());
        }

        let rewritten = self.rules.apply(text);
        let result = self
            .log
            .commit(Operation::Text(text.to_string()), || {
                self.injector.type_text(&rewritten)
            });
        self.track(result)?;

        tracing::info!("Relayed text: {:?} -> {:?}", text, rewritten);
        self.metrics.record_text(rewritten.chars().count());
        Ok(())
    }

    pub fn send_enter(&self) -> Result<(), RelayError> {
        let result = self
            .log
            .commit(Operation::Enter, || self.injector.press_key("enter"));
        self.track(result)?;

        tracing::info!("Relayed enter");
        self.metrics.record_key();
        Ok(())
    }

    /// Send a `+`-joined chord (`Ctrl+Shift+P`) or a single named key (`Esc`).
    pub fn send_hotkey(&self, spec: &str) -> Result<(), RelayError> {
        let hotkey = Hotkey::parse(spec)?;

        let result = self
            .log
            .commit(Operation::Hotkey(spec.trim().to_string()), || match &hotkey {
                Hotkey::Single(key) => self.injector.press_key(key),
                Hotkey::Chord(keys) => self.injector.press_chord(keys),
            });
        self.track(result)?;

        tracing::info!("Relayed hotkey: {}", hotkey);
        self.metrics.record_key();
        Ok(())
    }

    /// Press an arrow key. Unknown directions are ignored without error.
    ///
    /// Cursor moves never touch the operation log.
    pub fn move_cursor(&self, direction: &str) -> Result<(), RelayError> {
        let Some(direction) = CursorDirection::parse(direction) else {
            tracing::debug!("Ignoring unknown cursor direction {:?}", direction);
            return Ok(());
        };

        self.track(self.injector.press_key(direction.key_name()))?;
        tracing::info!("Moved cursor {}", direction.key_name());
        self.metrics.record_key();
        Ok(())
    }

    /// Delete one character on the host. Marks history as non-restorable.
    pub fn delete_pc(&self) -> Result<(), RelayError> {
        let result = self
            .log
            .commit(Operation::Delete, || self.injector.backspace(1));
        self.track(result)?;

        tracing::info!("Relayed delete");
        self.metrics.record_key();
        Ok(())
    }

    /// Reverse the last operation and return its restorable content.
    pub fn undo(&self) -> Result<String, RelayError> {
        let result = self.log.undo(|operation| self.reverse(operation));

        match &result {
            Ok(_) => self.metrics.record_undo(),
            Err(RelayError::NoHistory) => {
                tracing::info!("Undo requested with no history");
                self.metrics.record_empty_undo();
            }
            Err(e) => {
                tracing::error!("Undo failed: {}", e);
                self.metrics.record_injector_failure();
            }
        }
        result
    }

    fn reverse(&self, operation: &Operation) -> Result<(), InjectorError> {
        match operation {
            Operation::Text(content) => {
                // Delete what was injected, which is the rewritten text
                let count = self.rules.apply(content).chars().count();
                if count == 0 {
                    return Ok(());
                }
                self.injector.backspace(count)
            }
            Operation::Enter => self.injector.backspace(1),
            Operation::Delete | Operation::Hotkey(_) => {
                tracing::info!("{} is not reversible, clearing history", operation.kind());
                Ok(())
            }
            Operation::None => Ok(()),
        }
    }

    /// Run a saved command or phrase: `[KEY]` entries as hotkeys, the rest as text.
    pub fn run_quick_option(&self, raw: &str) -> Result<(), RelayError> {
        match QuickOption::parse(raw) {
            QuickOption::Hotkey(spec) => self.send_hotkey(&spec),
            QuickOption::Text(text) => self.send_text(&text),
        }
    }

    // Pointer and screen

    pub fn move_mouse(&self, dx: i32, dy: i32) -> Result<(), RelayError> {
        self.track(self.injector.move_mouse_relative(dx, dy))?;
        self.metrics.record_pointer();
        Ok(())
    }

    pub fn click(&self, button: &str, count: u32) -> Result<(), RelayError> {
        let button = MouseButton::parse(button)?;
        if count == 0 {
            return Err(RelayError::InvalidInput(
                "click count must be at least 1".to_string(),
            ));
        }

        self.track(self.injector.click(button, count))?;
        tracing::info!("Clicked {} x{}", button, count);
        self.metrics.record_pointer();
        Ok(())
    }

    pub fn screenshot(&self) -> Result<Vec<u8>, RelayError> {
        let bytes = self.track(self.injector.screenshot())?;
        tracing::info!("Captured screenshot ({} bytes)", bytes.len());
        Ok(bytes)
    }

    // Quick options

    pub fn quick_options(&self) -> (Vec<String>, Vec<String>) {
        self.options.snapshot()
    }

    pub fn save_quick_options(
        &self,
        commands: &[String],
        phrases: &[String],
    ) -> Result<(), RelayError> {
        self.options.save(commands, phrases).map_err(|e| {
            tracing::error!("Failed to save quick options: {:#}", e);
            RelayError::from(e)
        })?;
        self.metrics.record_options_saved();
        Ok(())
    }

    pub fn reload_quick_options(&self) -> Result<(), RelayError> {
        self.options.reload().map_err(RelayError::from)
    }

    // Authentication

    pub fn auth_enabled(&self) -> bool {
        self.auth.is_enabled()
    }

    pub fn is_authorized(&self, session_authenticated: bool) -> bool {
        self.auth.is_authorized(session_authenticated)
    }

    /// Liveness probe: `(healthy, authorized)` for a session.
    pub fn health(&self, session_authenticated: bool) -> (bool, bool) {
        (true, self.is_authorized(session_authenticated))
    }

    /// Check a password for `identity`, honouring the lockout.
    pub fn authenticate(&self, identity: &str, password: &str) -> Result<(), RelayError> {
        match self.auth.attempt(identity, password) {
            AuthOutcome::Granted => Ok(()),
            AuthOutcome::Rejected { remaining_attempts } => {
                self.metrics.record_auth_failure();
                Err(RelayError::InvalidPassword { remaining_attempts })
            }
            AuthOutcome::LockedOut { remaining_secs } => {
                self.metrics.record_lockout();
                Err(RelayError::LockedOut { remaining_secs })
            }
        }
    }

    // Accessors

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn options(&self) -> &QuickOptionsStore {
        &self.options
    }

    pub fn auth(&self) -> &AuthGuard {
        &self.auth
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.metrics)
    }

    fn track<T>(&self, result: Result<T, InjectorError>) -> Result<T, RelayError> {
        result.map_err(|e| {
            tracing::error!("Injector failed: {}", e);
            self.metrics.record_injector_failure();
            RelayError::Injector(e)
        })
    }
}
