//! TV Settings - Ethernet configuration and onboarding tutorial
//!
//! ## Architecture
//!
//! TV Settings is organized into specialized crates:
//!
//! - `tv-settings-core`: Configuration, errors and the preference store
//! - `tv-settings-ethernet`: Ethernet configuration file, validation and connectivity
//! - `tv-settings-tutorial`: Tutorial step list and step controller

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use tv_settings_core as core;
pub use tv_settings_ethernet as ethernet;
pub use tv_settings_tutorial as tutorial;

/// Prelude module for convenient imports
pub mod prelude {
    pub use tv_settings_core::{AppConfig, FilePreferences, PreferenceStore};
    pub use tv_settings_ethernet::{
        EthernetConfiguration, EthernetForm, EthernetStore, SystemConnectivity,
    };
    pub use tv_settings_tutorial::{PrivacyConsentHook, TutorialController, TutorialStep};
}
