/// Prefix marking a quick option as a raw key combination instead of literal text.
pub const HOTKEY_PREFIX: &str = "[KEY]";

/// A reusable command or phrase offered to the phone UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickOption {
    /// Typed into the host as text.
    Text(String),

    /// Sent as a hotkey, e.g. `[KEY]Ctrl+Shift+P` becomes `Ctrl+Shift+P`.
    Hotkey(String),
}

impl QuickOption {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_prefix(HOTKEY_PREFIX) {
            Some(spec) => QuickOption::Hotkey(spec.trim().to_string()),
            None => QuickOption::Text(trimmed.to_string()),
        }
    }
}
