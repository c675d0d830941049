use serde::Serialize;

/// The last mutating action performed on the host.
///
/// Exactly one `Operation` is live at a time, held by
/// [`OperationLog`](crate::state::OperationLog). Undo is single level: it consumes
/// the live operation and resets the slot to [`Operation::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Operation {
    #[default]
    None,

    /// Text relayed to the host, stored before rewrite rules are applied.
    Text(String),

    Enter,

    /// A backward delete issued from the phone. Not reversible.
    Delete,

    /// A hotkey as the client sent it. Not reversible.
    Hotkey(String),
}

impl Operation {
    pub fn is_none(&self) -> bool {
        matches!(self, Operation::None)
    }

    /// Short name used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::None => "none",
            Operation::Text(_) => "text",
            Operation::Enter => "enter",
            Operation::Delete => "delete",
            Operation::Hotkey(_) => "hotkey",
        }
    }

    /// Content handed back to the client after an undo so it can refill its input.
    ///
    /// Only text operations carry restorable content.
    pub fn restorable_content(&self) -> &str {
        match self {
            Operation::Text(content) => content,
            Operation::None | Operation::Enter | Operation::Delete | Operation::Hotkey(_) => "",
        }
    }
}
