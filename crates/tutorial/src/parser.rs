//! Tutorial step list parser
//!
//! Reads the declarative step list: `<step>` elements under any root, in
//! display order. Attribute names may carry a namespace prefix.

use std::path::{Path, PathBuf};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::step::{ResourceId, TutorialStep};

/// Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value {value:?} for attribute {attribute} of step {step:?}")]
    InvalidAttribute {
        step: String,
        attribute: String,
        value: String,
    },
}

const TAG_STEP: &[u8] = b"step";

/// Where the step list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSource {
    /// XML held in memory
    Inline(String),
    /// XML file on disk
    File(PathBuf),
}

impl StepSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        StepSource::File(path.as_ref().to_path_buf())
    }

    fn read(&self) -> Result<String, ParseError> {
        match self {
            StepSource::Inline(xml) => Ok(xml.clone()),
            StepSource::File(path) => Ok(std::fs::read_to_string(path)?),
        }
    }
}

/// Tutorial step parser
pub struct StepParser;

impl StepParser {
    /// Parse every step included for `setup_version`
    pub fn parse_str(xml: &str, setup_version: i32) -> Result<Vec<TutorialStep>, ParseError> {
        let mut steps = Vec::new();
        Self::parse_into(xml, setup_version, &mut steps)?;
        Ok(steps)
    }

    /// Parse a step source
    pub fn parse_source(
        source: &StepSource,
        setup_version: i32,
    ) -> Result<Vec<TutorialStep>, ParseError> {
        Self::parse_str(&source.read()?, setup_version)
    }

    /// Load a source, keeping whatever was parsed before a failure
    pub fn load_lossy(source: &StepSource, setup_version: i32) -> Vec<TutorialStep> {
        let mut steps = Vec::new();
        let result = source
            .read()
            .and_then(|xml| Self::parse_into(&xml, setup_version, &mut steps));

        match result {
            Ok(()) => debug!(
                "Loaded {} tutorial steps for setup version {}",
                steps.len(),
                setup_version
            ),
            Err(ParseError::Io(e)) => warn!("Could not read tutorial steps: {}", e),
            Err(e) => warn!("Could not parse tutorial steps, kept {}: {}", steps.len(), e),
        }
        steps
    }

    /// Append included steps to `steps` in document order
    fn parse_into(
        xml: &str,
        setup_version: i32,
        steps: &mut Vec<TutorialStep>,
    ) -> Result<(), ParseError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.local_name().as_ref() == TAG_STEP =>
                {
                    match Self::parse_step(e)? {
                        None => warn!("Skipping tutorial step without a key"),
                        Some(step) if !step.is_included_for(setup_version) => {
                            debug!("Step {} excluded for version {}", step.key(), setup_version);
                        }
                        Some(step) if steps.iter().any(|s| s.key() == step.key()) => {
                            warn!("Skipping duplicate tutorial step {}", step.key())
                        }
                        Some(step) => steps.push(step),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn parse_step(e: &BytesStart) -> Result<Option<TutorialStep>, ParseError> {
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((name, value));
        }

        let Some(key) = attrs
            .iter()
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.clone())
        else {
            return Ok(None);
        };

        let mut step = TutorialStep::new(key.as_str());
        for (name, value) in &attrs {
            let invalid = || ParseError::InvalidAttribute {
                step: key.clone(),
                attribute: name.clone(),
                value: value.clone(),
            };
            match name.as_str() {
                "key" => {}
                "image" => step.image = parse_resource(value).ok_or_else(invalid)?,
                "text" => step.text = parse_resource(value).ok_or_else(invalid)?,
                "titleResource" => step.title = parse_resource(value).ok_or_else(invalid)?,
                "titleImage" => step.title_image = parse_resource(value).ok_or_else(invalid)?,
                "backgroundImage" => step.background = parse_resource(value).ok_or_else(invalid)?,
                "modelDependentText" => {
                    step.model_dependent_text = parse_bool(value).ok_or_else(invalid)?
                }
                "tip" => step.tip = parse_bool(value).ok_or_else(invalid)?,
                "minSetupVersion" => {
                    step.min_setup_version = Some(value.trim().parse().map_err(|_| invalid())?)
                }
                "maxSetupVersion" => {
                    step.max_setup_version = Some(value.trim().parse().map_err(|_| invalid())?)
                }
                other => debug!("Ignoring attribute {} on step {}", other, key),
            }
        }

        Ok(Some(step))
    }
}

fn parse_resource(value: &str) -> Option<ResourceId> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => ResourceId::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
