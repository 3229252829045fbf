//! Advance hooks
//!
//! Per-step callbacks run when the user moves past a step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tv_settings_core::PreferenceStore;

use crate::step::TutorialStep;

/// Settings key holding the usage logging choice
pub const USAGE_LOGGING_KEY: &str = "checkin_usage_logging_enabled";

/// Callback run after a step is marked complete
pub trait AdvanceHook: Send + Sync {
    fn on_advance(&self, step: &TutorialStep);
}

/// Persists the usage logging choice made on the privacy step
pub struct PrivacyConsentHook {
    settings: Arc<dyn PreferenceStore>,
    consent: AtomicBool,
}

impl PrivacyConsentHook {
    /// Hook pre-filled with the stored choice
    pub fn new(settings: Arc<dyn PreferenceStore>) -> Self {
        let consent = AtomicBool::new(settings.get_bool(USAGE_LOGGING_KEY, false));
        Self { settings, consent }
    }

    /// Choice currently stored in settings
    pub fn stored_value(&self) -> bool {
        self.settings.get_bool(USAGE_LOGGING_KEY, false)
    }

    /// Record the choice shown on screen
    pub fn set_consent(&self, enabled: bool) {
        self.consent.store(enabled, Ordering::SeqCst);
    }

    pub fn consent(&self) -> bool {
        self.consent.load(Ordering::SeqCst)
    }
}

impl AdvanceHook for PrivacyConsentHook {
    fn on_advance(&self, step: &TutorialStep) {
        let enabled = self.consent();
        match self.settings.put_bool(USAGE_LOGGING_KEY, enabled) {
            Ok(()) => info!(
                "Usage logging {} from step {}",
                if enabled { "enabled" } else { "disabled" },
                step.key()
            ),
            Err(e) => warn!("Could not store usage logging choice: {}", e.user_message()),
        }
    }
}
