use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relay configuration from `Relay Config.yaml`.
///
/// Every section has defaults, so an empty or missing file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub auth: AuthSettings,
    pub files: FileSettings,
    pub logging: LoggingSettings,
}

/// Login protection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Access password. `None` disables authentication entirely.
    pub password: Option<String>,

    /// Failed attempts before an identity is locked out.
    pub max_attempts: u32,

    /// Lockout window length in seconds.
    pub lockout_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            password: None,
            max_attempts: default_max_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

impl AuthSettings {
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }

    /// An empty password string counts as "no password".
    pub fn effective_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// Names of the line-oriented data files, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub rules: String,
    pub commands: String,
    pub phrases: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            rules: "hot-rule.txt".to_string(),
            commands: "commands.txt".to_string(),
            phrases: "phrases.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub debug: bool,
    /// Mirror log output to stderr.
    pub console: bool,
    /// Write the log file as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_secs() -> u64 {
    300
}
