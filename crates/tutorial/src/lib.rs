//! Tutorial Step Controller
//!
//! Loads the ordered onboarding steps from an XML step list, gated by the
//! device's setup version, and drives forward, back, skip and repeat
//! navigation. Completion of each step is a flag in the preference store.

pub mod controller;
pub mod hooks;
pub mod parser;
pub mod step;

pub use controller::{
    pref_key, setup_version_from_settings, TutorialController, PREF_KEY_PREFIX, SETUP_VERSION_KEY,
};
pub use hooks::{AdvanceHook, PrivacyConsentHook, USAGE_LOGGING_KEY};
pub use parser::{ParseError, StepParser, StepSource};
pub use step::{ResourceId, TutorialStep, PRIVACY_STEP_KEY};
