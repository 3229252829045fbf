//! Application Configuration
//!
//! Manages where the settings layer keeps its state:
//! - Ethernet configuration file and interface name
//! - Tutorial step source and setup version override
//! - Preference and secure settings stores
//! - Logging level

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{Result, TvSettingsError};

/// Ethernet configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EthernetSection {
    /// Path of the versioned IP/proxy configuration file
    pub config_path: PathBuf,
    /// Interface cycled after a configuration is applied
    pub interface: String,
}

impl Default for EthernetSection {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/data/misc/ethernet/etherconfig.txt"),
            interface: "eth0".to_string(),
        }
    }
}

/// Tutorial configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TutorialSection {
    /// Declarative XML list of tutorial steps
    pub steps_path: PathBuf,
    /// Overrides the setup version stored in secure settings
    pub setup_version: Option<i32>,
    /// Device model substituted into model dependent step text
    pub device_model: String,
}

impl Default for TutorialSection {
    fn default() -> Self {
        Self {
            steps_path: AppConfig::data_dir_or_cwd().join("tutorial_steps.xml"),
            setup_version: None,
            device_model: "Google TV".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSection {
    /// Per-user preferences (tutorial completion flags)
    pub preferences_path: PathBuf,
    /// Device-wide secure settings
    pub settings_path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        let data_dir = AppConfig::data_dir_or_cwd();
        Self {
            preferences_path: data_dir.join("preferences.json"),
            settings_path: data_dir.join("secure_settings.json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter directive, overridden by `TV_SETTINGS_LOG`
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Ethernet settings
    pub ethernet: EthernetSection,
    /// Tutorial settings
    pub tutorial: TutorialSection,
    /// Storage locations
    pub storage: StorageSection,
    /// Logging settings
    pub logging: LoggingSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            ethernet: EthernetSection::default(),
            tutorial: TutorialSection::default(),
            storage: StorageSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tvsettings", "TV-Settings")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tvsettings", "TV-Settings")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn data_dir_or_cwd() -> PathBuf {
        Self::data_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| TvSettingsError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a file, writing defaults if it does not exist
    pub async fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file {:?} not found, using defaults", path);
            let config = AppConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| TvSettingsError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to a file
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.ethernet.interface, "eth0");
        assert_eq!(
            config.ethernet.config_path,
            PathBuf::from("/data/misc/ethernet/etherconfig.txt")
        );
        assert_eq!(config.tutorial.setup_version, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [ethernet]
            interface = "eth1"

            [tutorial]
            setup_version = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.ethernet.interface, "eth1");
        assert_eq!(
            config.ethernet.config_path,
            EthernetSection::default().config_path
        );
        assert_eq!(config.tutorial.setup_version, Some(4));
        assert_eq!(config.logging, LoggingSection::default());
    }

    #[tokio::test]
    async fn test_load_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }
}
