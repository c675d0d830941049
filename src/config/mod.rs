use crate::models::RelayConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix for environment overrides, e.g. `KEYRELAY_AUTH__PASSWORD`.
pub const ENV_PREFIX: &str = "KEYRELAY";

/// Name of the settings file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "Relay Config.yaml";

/// Configuration manager for the relay data directory.
///
/// The data directory holds:
/// - `Relay Config.yaml`: auth, file names and logging settings
/// - the rewrite rule file (default `hot-rule.txt`)
/// - the quick option files (default `commands.txt` and `phrases.txt`)
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating the data directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the relay configuration.
    ///
    /// Sources are layered, later ones winning:
    /// 1. built-in defaults
    /// 2. `Relay Config.yaml` (optional)
    /// 3. `KEYRELAY_<SECTION>__<KEY>` environment variables
    pub fn load_config(&self) -> Result<RelayConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::from(self.config_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: RelayConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!(
            "Loaded config from {} (auth enabled: {})",
            self.config_path,
            config.auth.effective_password().is_some()
        );
        Ok(config)
    }

    /// Save the relay configuration as YAML.
    pub fn save_config(&self, config: &RelayConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Write the default configuration if no config file exists yet.
    ///
    /// Returns `true` when a file was created.
    pub fn ensure_config(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }
        self.save_config(&RelayConfig::default())?;
        Ok(true)
    }

    /// Resolve a data file name from the config against the data directory.
    ///
    /// Absolute names are returned unchanged.
    pub fn resolve(&self, file_name: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(file_name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    pub fn rules_path(&self, config: &RelayConfig) -> Utf8PathBuf {
        self.resolve(&config.files.rules)
    }

    pub fn commands_path(&self, config: &RelayConfig) -> Utf8PathBuf {
        self.resolve(&config.files.commands)
    }

    pub fn phrases_path(&self, config: &RelayConfig) -> Utf8PathBuf {
        self.resolve(&config.files.phrases)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.config_path().as_str().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_save_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = RelayConfig::default();
        config.auth.max_attempts = 3;
        config.files.rules = "rules.txt".to_string();
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.auth.max_attempts, 3);
        assert_eq!(loaded.files.rules, "rules.txt");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let (manager, temp_dir) = create_test_config_manager();

        let relative = manager.resolve("hot-rule.txt");
        assert!(relative.starts_with(manager.config_dir()));

        let absolute_path = temp_dir.path().join("elsewhere.txt");
        let absolute = absolute_path.to_str().unwrap();
        assert_eq!(manager.resolve(absolute).as_str(), absolute);
    }

    #[test]
    fn test_ensure_config_only_writes_once() {
        let (manager, _temp_dir) = create_test_config_manager();

        assert!(manager.ensure_config().unwrap());
        assert!(manager.config_path().exists());
        assert!(!manager.ensure_config().unwrap());
    }
}
