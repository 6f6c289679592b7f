// SPDX-License-Identifier: MIT

//! Environment - externally supplied argument values for a run
//!
//! Arguments are looked up in two scopes. `global` applies to every external
//! input; `inputs[node][input]` applies to one input and wins on conflicts.
//!
//! ```yaml
//! global:
//!   region: eu
//! inputs:
//!   load_numbers:
//!     numbers:
//!       values: [1, 2, 3]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::error::TaskGraphError;

/// Read-only argument values for one run
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Environment {
    /// Arguments visible to every external source
    #[serde(default)]
    pub global: Map<String, Value>,
    /// node name -> input name -> arguments
    #[serde(default)]
    pub inputs: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
}

impl Environment {
    /// The no-op environment
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.inputs.is_empty()
    }

    /// Set a global argument
    pub fn with_global(mut self, key: impl Into<String>, value: Value) -> Self {
        self.global.insert(key.into(), value);
        self
    }

    /// Set an argument for one node input
    pub fn with_input_arg(
        mut self,
        node: impl Into<String>,
        input: impl Into<String>,
        key: impl Into<String>,
        value: Value,
    ) -> Self {
        self.inputs
            .entry(node.into())
            .or_default()
            .entry(input.into())
            .or_default()
            .insert(key.into(), value);
        self
    }

    /// Arguments seen by `node`.`input`: global values overlaid with the input's own
    pub fn arguments_for(&self, node: &str, input: &str) -> Map<String, Value> {
        let mut args = self.global.clone();
        if let Some(scoped) = self.inputs.get(node).and_then(|inputs| inputs.get(input)) {
            for (k, v) in scoped {
                args.insert(k.clone(), v.clone());
            }
        }
        args
    }

    /// Load an environment from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TaskGraphError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse an environment from a YAML string. An empty document is the empty environment.
    pub fn from_yaml(content: &str) -> Result<Self, TaskGraphError> {
        if content.trim().is_empty() {
            return Ok(Self::empty());
        }
        let env: Environment = serde_yaml::from_str(content)?;
        Ok(env)
    }
}
