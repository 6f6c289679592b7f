// SPDX-License-Identifier: MIT

//! YAML schema types for the pipelines document
//!
//! ```yaml
//! pipelines:
//!   - module: demos
//!     fn: arithmetic
//! ```

use serde::{Deserialize, Serialize};

/// Top-level pipelines document
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PipelinesConfig {
    pub pipelines: Vec<PipelineEntry>,
}

/// One graph factory reference
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineEntry {
    pub module: String,
    #[serde(rename = "fn")]
    pub function: String,
}

impl PipelineEntry {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }

    /// Display label, `module.function`
    pub fn key(&self) -> String {
        factory_key(&self.module, &self.function)
    }
}

/// `module.function` label for logs and errors. Not unique for dotted module
/// names; the registry looks factories up by the pair itself.
pub fn factory_key(module: &str, function: &str) -> String {
    format!("{}.{}", module, function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let yaml = r#"
pipelines:
  - module: demos
    fn: arithmetic
  - module: reports.daily
    fn: build
"#;
        let config: PipelinesConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pipelines.len(), 2);
        assert_eq!(config.pipelines[0], PipelineEntry::new("demos", "arithmetic"));
        assert_eq!(config.pipelines[1].key(), "reports.daily.build");
    }

    #[test]
    fn test_missing_fn_is_an_error() {
        let yaml = r#"
pipelines:
  - module: demos
"#;
        let result: Result<PipelinesConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_pipelines_key_is_an_error() {
        let result: Result<PipelinesConfig, _> = serde_yaml::from_str("other: 1");
        assert!(result.is_err());
    }
}
