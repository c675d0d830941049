use crate::error::RelayError;
use std::fmt;

/// A parsed hotkey request.
///
/// Key names are lower-cased and a few aliases are normalised. Anything else is
/// passed through untouched; the injector decides whether it knows the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hotkey {
    /// One key press, e.g. `Esc` → `escape`.
    Single(String),

    /// Keys held together, e.g. `Ctrl+Shift+P` → `["ctrl", "shift", "p"]`.
    Chord(Vec<String>),
}

impl Hotkey {
    /// Parse a `+`-joined chord or a single named key.
    pub fn parse(spec: &str) -> Result<Self, RelayError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(RelayError::InvalidInput("hotkey is empty".to_string()));
        }

        // A lone "+" is the plus key, not an empty chord
        if spec.contains('+') && spec != "+" {
            let keys = spec
                .split('+')
                .map(|token| {
                    let token = token.trim();
                    if token.is_empty() {
                        Err(RelayError::InvalidInput(format!(
                            "hotkey '{}' has an empty key",
                            spec
                        )))
                    } else {
                        Ok(chord_alias(&token.to_lowercase()))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Hotkey::Chord(keys))
        } else {
            Ok(Hotkey::Single(single_alias(&spec.to_lowercase())))
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hotkey::Single(key) => write!(f, "{}", key),
            Hotkey::Chord(keys) => write!(f, "{}", keys.join("+")),
        }
    }
}

fn chord_alias(key: &str) -> String {
    match key {
        "cmd" => "command",
        "`" => "backquote",
        other => other,
    }
    .to_string()
}

fn single_alias(key: &str) -> String {
    match key {
        "esc" => "escape",
        other => other,
    }
    .to_string()
}

/// Arrow key directions accepted by `move_cursor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Left,
    Up,
    Down,
    Right,
}

impl CursorDirection {
    /// Returns `None` for anything outside the four arrow keys.
    pub fn parse(direction: &str) -> Option<Self> {
        match direction {
            "left" => Some(CursorDirection::Left),
            "up" => Some(CursorDirection::Up),
            "down" => Some(CursorDirection::Down),
            "right" => Some(CursorDirection::Right),
            _ => None,
        }
    }

    pub fn key_name(self) -> &'static str {
        match self {
            CursorDirection::Left => "left",
            CursorDirection::Up => "up",
            CursorDirection::Down => "down",
            CursorDirection::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn parse(button: &str) -> Result<Self, RelayError> {
        match button.trim().to_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(RelayError::InvalidInput(format!(
                "unknown mouse button '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        f.write_str(name)
    }
}
