//! Named text processor with an immutable configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processor options.
///
/// Deserializes from a flat mapping such as `{"uppercase": true}`; unknown
/// keys are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Upper-case instead of lower-case
    pub uppercase: bool,
}

impl ProcessorConfig {
    /// Parse a JSON mapping
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if the text is not a valid option mapping
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::validation(format!("invalid processor config: {e}")))
    }
}

/// Applies a fixed case transformation to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProcessor {
    name: String,
    config: ProcessorConfig,
}

impl DataProcessor {
    /// Create a processor
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `name` is blank
    pub fn new(name: impl Into<String>, config: ProcessorConfig) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::validation("name must be a non-empty string"));
        }
        Ok(Self { name, config })
    }

    /// Processor name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processor options
    #[must_use]
    pub const fn config(&self) -> ProcessorConfig {
        self.config
    }

    /// Trim `text`, then upper- or lower-case it
    #[must_use]
    pub fn transform_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        if self.config.uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_lowercase()
        }
    }
}

impl fmt::Display for DataProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataProcessor(name={:?})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let processor = DataProcessor::new("test_processor", ProcessorConfig::default()).unwrap();
        assert_eq!(processor.name(), "test_processor");
        assert!(!processor.config().uppercase);
    }

    #[test]
    fn test_transform_text_lowercases_by_default() {
        let processor = DataProcessor::new("test", ProcessorConfig::default()).unwrap();
        assert_eq!(processor.transform_text("  Hello World  "), "hello world");
    }

    #[test]
    fn test_transform_text_uppercase() {
        let config = ProcessorConfig::from_json(r#"{"uppercase": true}"#).unwrap();
        let processor = DataProcessor::new("test", config).unwrap();
        assert_eq!(processor.transform_text("hello world"), "HELLO WORLD");
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        assert!(ProcessorConfig::from_json(r#"{"titlecase": true}"#).is_err());
        assert_eq!(ProcessorConfig::from_json("{}").unwrap(), ProcessorConfig::default());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(DataProcessor::new("  ", ProcessorConfig::default()).is_err());
    }

    #[test]
    fn test_display() {
        let processor = DataProcessor::new("p1", ProcessorConfig::default()).unwrap();
        assert_eq!(processor.to_string(), r#"DataProcessor(name="p1")"#);
    }
}
