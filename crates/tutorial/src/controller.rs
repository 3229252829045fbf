//! Tutorial step controller
//!
//! The current position is never stored. It is derived on every query as the
//! first step whose completion flag is false, so the completion flags in the
//! preference store are the only state that survives a restart.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tv_settings_core::{PreferenceStore, Result};

use crate::hooks::AdvanceHook;
use crate::parser::{StepParser, StepSource};
use crate::step::TutorialStep;

/// Prefix of the completion flag of each step
pub const PREF_KEY_PREFIX: &str = "tutorial_";

/// Settings key holding the last completed setup version
pub const SETUP_VERSION_KEY: &str = "setup_version";

/// Completion flag key for a step key
pub fn pref_key(step_key: &str) -> String {
    format!("{}{}", PREF_KEY_PREFIX, step_key)
}

/// Read the setup version from secure settings, 0 when unset
pub fn setup_version_from_settings(settings: &dyn PreferenceStore) -> i32 {
    let version = settings.get_int(SETUP_VERSION_KEY, 0);
    i32::try_from(version).unwrap_or_else(|_| {
        warn!("Setup version {} out of range, using 0", version);
        0
    })
}

/// Sequences the onboarding tutorial
pub struct TutorialController {
    prefs: Arc<dyn PreferenceStore>,
    steps: Vec<TutorialStep>,
    hooks: HashMap<String, Arc<dyn AdvanceHook>>,
    setup_version: i32,
}

impl TutorialController {
    /// Controller over an already loaded step list
    pub fn new(
        prefs: Arc<dyn PreferenceStore>,
        steps: Vec<TutorialStep>,
        setup_version: i32,
    ) -> Self {
        Self {
            prefs,
            steps,
            hooks: HashMap::new(),
            setup_version,
        }
    }

    /// Load steps for `setup_version`. Read and parse failures leave an empty
    /// or partial list.
    pub fn load(prefs: Arc<dyn PreferenceStore>, source: &StepSource, setup_version: i32) -> Self {
        let steps = StepParser::load_lossy(source, setup_version);
        info!("Tutorial has {} steps for setup version {}", steps.len(), setup_version);
        Self::new(prefs, steps, setup_version)
    }

    pub fn from_str(prefs: Arc<dyn PreferenceStore>, xml: &str, setup_version: i32) -> Self {
        Self::load(prefs, &StepSource::Inline(xml.to_string()), setup_version)
    }

    pub fn from_file(
        prefs: Arc<dyn PreferenceStore>,
        path: impl AsRef<Path>,
        setup_version: i32,
    ) -> Self {
        Self::load(prefs, &StepSource::file(path), setup_version)
    }

    /// Run `hook` whenever the step with `key` is advanced past
    pub fn register_hook(&mut self, key: impl Into<String>, hook: Arc<dyn AdvanceHook>) {
        self.hooks.insert(key.into(), hook);
    }

    pub fn steps(&self) -> &[TutorialStep] {
        &self.steps
    }

    pub fn setup_version(&self) -> i32 {
        self.setup_version
    }

    pub fn is_step_complete(&self, key: &str) -> bool {
        self.prefs.get_bool(&pref_key(key), false)
    }

    pub fn set_step_complete(&self, key: &str, complete: bool) -> Result<()> {
        self.prefs.put_bool(&pref_key(key), complete)
    }

    /// Set several completion flags in one commit
    pub fn set_steps_complete<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
        complete: bool,
    ) -> Result<()> {
        let pref_keys: Vec<String> = keys.into_iter().map(pref_key).collect();
        let entries: Vec<(&str, bool)> = pref_keys.iter().map(|k| (k.as_str(), complete)).collect();
        self.prefs.put_bools(&entries)
    }

    fn current_index(&self) -> Option<usize> {
        self.steps.iter().position(|s| !self.is_step_complete(s.key()))
    }

    /// First step not yet completed, `None` once the tutorial is done
    pub fn current_step(&self) -> Option<&TutorialStep> {
        self.current_index().map(|i| &self.steps[i])
    }

    /// Complete the current step and run its hook.
    ///
    /// Returns whether more steps follow. This is computed from the index of
    /// the step being completed as `index < len - 2`, so advancing from the
    /// second to last step already reports `false`.
    pub fn advance(&self) -> bool {
        let Some(index) = self.current_index() else {
            debug!("Advance requested with no remaining steps");
            return false;
        };
        let has_more = index + 2 < self.steps.len();
        let step = &self.steps[index];

        if let Err(e) = self.set_step_complete(step.key(), true) {
            warn!("Could not mark step {} complete: {}", step.key(), e.user_message());
        }
        if let Some(hook) = self.hooks.get(step.key()) {
            hook.on_advance(step);
        }

        debug!("Advanced past step {}", step.key());
        has_more
    }

    /// Reopen the step before the current one and return it.
    ///
    /// Returns `None` on the first step and once every step is complete.
    pub fn previous_step(&self) -> Option<&TutorialStep> {
        let index = self.current_index()?;
        if index == 0 {
            return None;
        }

        let previous = &self.steps[index - 1];
        if let Err(e) = self.set_step_complete(previous.key(), false) {
            warn!("Could not reopen step {}: {}", previous.key(), e.user_message());
        }
        Some(previous)
    }

    /// Mark every step complete
    pub fn skip_tutorial(&self) {
        if let Err(e) = self.set_steps_complete(self.steps.iter().map(|s| s.key()), true) {
            warn!("Could not skip tutorial: {}", e.user_message());
        }
    }

    /// Mark every step incomplete
    pub fn repeat_tutorial(&self) {
        if let Err(e) = self.set_steps_complete(self.steps.iter().map(|s| s.key()), false) {
            warn!("Could not reset tutorial: {}", e.user_message());
        }
    }

    /// Whether `step` is the final step of the sequence
    pub fn is_last_step(&self, step: &TutorialStep) -> bool {
        self.steps.last().is_some_and(|last| last.key() == step.key())
    }

    /// Number of tips up to and including the current step
    pub fn tip_number(&self) -> usize {
        let mut number = 0;
        for step in &self.steps {
            if step.is_tip() {
                number += 1;
            }
            if !self.is_step_complete(step.key()) {
                break;
            }
        }
        number
    }

    pub fn total_tips(&self) -> usize {
        self.steps.iter().filter(|s| s.is_tip()).count()
    }
}
