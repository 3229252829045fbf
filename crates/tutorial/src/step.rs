//! Tutorial step model

/// Opaque handle to presentable content, resolved by the UI layer
pub type ResourceId = u32;

/// Key of the step that asks for usage logging consent
pub const PRIVACY_STEP_KEY: &str = "privacy_confirm";

/// One page of the onboarding tutorial
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialStep {
    key: String,
    /// Title text
    pub title: ResourceId,
    /// Body text
    pub text: ResourceId,
    /// Main image
    pub image: ResourceId,
    /// Image shown beside the title
    pub title_image: ResourceId,
    /// Background image, 0 for the default background
    pub background: ResourceId,
    /// Body text contains a placeholder for the device model
    pub model_dependent_text: bool,
    /// Counted tip, as opposed to intro and outro screens
    pub tip: bool,
    /// Only shown when the setup version is at least this
    pub min_setup_version: Option<i32>,
    /// Only shown when the setup version is at most this
    pub max_setup_version: Option<i32>,
}

impl TutorialStep {
    /// Create a step with no content
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Create a counted tip
    pub fn tip(key: impl Into<String>) -> Self {
        Self {
            tip: true,
            ..Self::new(key)
        }
    }

    /// Unique key of the step
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_tip(&self) -> bool {
        self.tip
    }

    /// Whether the step belongs in the tutorial for `setup_version`
    pub fn is_included_for(&self, setup_version: i32) -> bool {
        self.min_setup_version.map_or(true, |min| setup_version >= min)
            && self.max_setup_version.map_or(true, |max| setup_version <= max)
    }

    /// Substitute the device model into resolved body text
    pub fn format_text(&self, template: &str, model: &str) -> String {
        if self.model_dependent_text {
            template.replace("%1$s", model).replace("%s", model)
        } else {
            template.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_gates() {
        let mut step = TutorialStep::new("voice");
        assert!(step.is_included_for(0));

        step.min_setup_version = Some(5);
        assert!(!step.is_included_for(3));
        assert!(step.is_included_for(5));

        step.max_setup_version = Some(6);
        assert!(step.is_included_for(6));
        assert!(!step.is_included_for(7));
    }

    #[test]
    fn test_format_text() {
        let mut step = TutorialStep::new("remote");
        assert_eq!(step.format_text("Pair your %s", "Nexus Player"), "Pair your %s");

        step.model_dependent_text = true;
        assert_eq!(step.format_text("Pair your %s", "Nexus Player"), "Pair your Nexus Player");
        assert_eq!(step.format_text("Your %1$s is ready", "ADT-1"), "Your ADT-1 is ready");
    }
}
