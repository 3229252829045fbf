//! Error types for TV Settings
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for TV Settings
#[derive(Error, Debug)]
pub enum TvSettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preference store error: {0}")]
    Store(String),
}

/// Result type alias for TV Settings operations
pub type Result<T> = std::result::Result<T, TvSettingsError>;

impl TvSettingsError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TvSettingsError::Io(e) => format!("File operation failed: {}", e),
            TvSettingsError::Config(msg) => format!("Configuration error: {}", msg),
            TvSettingsError::Store(msg) => format!("Could not save settings: {}", msg),
            TvSettingsError::TomlParse(e) => format!("Configuration file is not valid TOML: {}", e),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_message() {
        let err = TvSettingsError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.user_message().starts_with("File operation failed"));
    }

    #[test]
    fn test_config_message() {
        let err = TvSettingsError::Config("bad".into());
        assert_eq!(err.user_message(), "Configuration error: bad");
    }

    #[test]
    fn test_toml_message() {
        let err = TvSettingsError::from(toml::from_str::<toml::Value>("= 1").unwrap_err());
        assert!(err.user_message().starts_with("Configuration file is not valid TOML"));
    }
}
