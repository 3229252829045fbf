//! TV Settings Core - Shared configuration and storage
//!
//! This crate provides the pieces shared by the Ethernet and tutorial crates:
//! the application configuration, the error type and the persistent
//! key/value store used for preferences and secure settings.

pub mod config;
pub mod error;
pub mod prefs;

pub use config::AppConfig;
pub use error::{Result, TvSettingsError};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};

/// TV Settings version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "TV Settings";
