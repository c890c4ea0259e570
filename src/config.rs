use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// General monitoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Clipboard poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Optional directory to watch for file changes (e.g. a screenshots folder)
    #[serde(default)]
    pub watch_dir: Option<PathBuf>,

    /// Log level for the rolling log file (error/warn/info/debug/trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            poll_interval_ms: default_poll_interval_ms(),
            watch_dir: None,
            log_level: default_log_level(),
        }
    }
}

/// Translation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Translation endpoint URL; empty disables translation
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

/// OCR settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Run OCR on copied images
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,

    /// Tesseract language spec
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            enabled: default_ocr_enabled(),
            language: default_ocr_language(),
        }
    }
}

// Default value functions for serde
fn default_poll_interval_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8080/translate".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    300
}

fn default_ocr_enabled() -> bool {
    true
}

fn default_ocr_language() -> String {
    "chi_sim+chi_tra".to_string()
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        // Read and parse TOML
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: poll_interval_ms={}, backend={}, ocr={}",
            config.general.poll_interval_ms,
            config.backend.url,
            config.ocr.enabled
        );

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        // Serialize to TOML
        let toml_str =
            toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Write to file
        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../hansnap.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

/// Ensure XDG data and config directories exist
/// Returns (data_dir, config_dir)
///
/// XDG Base Directory Specification:
/// - Data: $XDG_DATA_HOME/hansnap (default: ~/.local/share/hansnap)
/// - Config: $XDG_CONFIG_HOME/hansnap (default: ~/.config/hansnap)
pub fn ensure_directories() -> Result<(PathBuf, PathBuf)> {
    let home = env::var("HOME").context("HOME environment variable not set")?;
    let home_path = PathBuf::from(home);

    let data_dir = if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("hansnap")
    } else {
        home_path.join(".local/share/hansnap")
    };

    let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("hansnap")
    } else {
        home_path.join(".config/hansnap")
    };

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

    log::debug!("Data directory: {:?}", data_dir);
    log::debug!("Config directory: {:?}", config_dir);

    Ok((data_dir, config_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.general.poll_interval_ms, 500);
        assert_eq!(config.general.log_level, "info");
        assert!(config.general.watch_dir.is_none());
        assert_eq!(config.backend.timeout_secs, 300);
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.language, "chi_sim+chi_tra");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
        [general]
        poll_interval_ms = 250

        [ocr]
        enabled = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.poll_interval_ms, 250);
        assert_eq!(config.general.log_level, "info");
        assert!(!config.ocr.enabled);
        assert_eq!(config.ocr.language, "chi_sim+chi_tra");
        assert_eq!(config.backend.timeout_secs, 300);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("hansnap.toml"));

        let mut config = Config::default();
        config.general.poll_interval_ms = 750;
        config.general.watch_dir = Some(PathBuf::from("/tmp/screenshots"));
        storage.save(&config).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.general.poll_interval_ms, 750);
        assert_eq!(
            loaded.general.watch_dir,
            Some(PathBuf::from("/tmp/screenshots"))
        );
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hansnap.toml");
        let storage = TomlConfigStorage::new(path.clone());

        let config = storage.load().unwrap();
        assert_eq!(config.general.poll_interval_ms, 500);
        assert!(path.exists());
    }
}
