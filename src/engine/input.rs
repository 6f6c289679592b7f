// SPDX-License-Identifier: MIT

//! Input bindings - where a node's input values come from
//!
//! An input is either sourced externally (a `Source` procedure fed with
//! arguments from the `Environment`) or produced by another node in the same
//! graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::{InputResolutionFailure, SourceError};
use super::node::Node;

/// Procedure producing an input value from environment arguments
pub trait Source: Send + Sync {
    fn resolve(&self, args: &Map<String, Value>) -> Result<Value, SourceError>;
}

impl<F> Source for F
where
    F: Fn(&Map<String, Value>) -> Result<Value, SourceError> + Send + Sync,
{
    fn resolve(&self, args: &Map<String, Value>) -> Result<Value, SourceError> {
        self(args)
    }
}

/// Shape constraint on a single source argument
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    #[default]
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ArgType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgType::Any => true,
            ArgType::String => value.is_string(),
            ArgType::Number => value.is_number(),
            ArgType::Integer => value.is_i64() || value.is_u64(),
            ArgType::Boolean => value.is_boolean(),
            ArgType::Array => value.is_array(),
            ArgType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::Any => "any",
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Integer => "integer",
            ArgType::Boolean => "boolean",
            ArgType::Array => "array",
            ArgType::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// Name of a JSON value's kind, for mismatch messages
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Definition of one expected source argument
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ArgumentDef {
    #[serde(rename = "type", default)]
    pub arg_type: ArgType,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Used when the argument is absent; only meaningful for optional arguments
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ArgumentDef {
    pub fn required(arg_type: ArgType) -> Self {
        Self {
            arg_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(arg_type: ArgType, default: Option<Value>) -> Self {
        Self {
            arg_type,
            required: false,
            default,
        }
    }
}

/// Expected arguments of an external source, keyed by argument name
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ArgumentSchema {
    #[serde(flatten)]
    pub args: BTreeMap<String, ArgumentDef>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arg(mut self, name: impl Into<String>, def: ArgumentDef) -> Self {
        self.args.insert(name.into(), def);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Pick the schema's arguments out of `available`, applying defaults and type checks.
    /// Arguments not named by the schema are dropped.
    pub fn select(
        &self,
        input: &str,
        available: &Map<String, Value>,
    ) -> Result<Map<String, Value>, InputResolutionFailure> {
        let mut selected = Map::new();

        for (name, def) in &self.args {
            let value = match available.get(name) {
                Some(v) => v.clone(),
                None => match (&def.default, def.required) {
                    (Some(default), _) => default.clone(),
                    (None, true) => {
                        return Err(InputResolutionFailure::MissingArgument {
                            input: input.to_string(),
                            argument: name.clone(),
                        })
                    }
                    (None, false) => continue,
                },
            };

            if !def.arg_type.matches(&value) {
                return Err(InputResolutionFailure::ArgumentTypeMismatch {
                    input: input.to_string(),
                    argument: name.clone(),
                    expected: def.arg_type.to_string(),
                    actual: value_kind(&value).to_string(),
                });
            }

            selected.insert(name.clone(), value);
        }

        Ok(selected)
    }
}

/// Where an input's value comes from
#[derive(Clone)]
pub enum BindingKind {
    /// Produced by a source procedure from environment arguments
    External {
        source: Arc<dyn Source>,
        schema: ArgumentSchema,
    },
    /// The output of another node in the same graph
    Dependency { depends_on: String },
}

impl fmt::Debug for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::External { schema, .. } => f
                .debug_struct("External")
                .field("schema", schema)
                .finish_non_exhaustive(),
            BindingKind::Dependency { depends_on } => f
                .debug_struct("Dependency")
                .field("depends_on", depends_on)
                .finish(),
        }
    }
}

/// A named node input and its binding
#[derive(Debug, Clone)]
pub struct InputBinding {
    name: String,
    kind: BindingKind,
}

impl InputBinding {
    /// Bind an input to an external source procedure
    pub fn external<F>(name: impl Into<String>, source: F, schema: ArgumentSchema) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Value, SourceError> + Send + Sync + 'static,
    {
        Self::from_source(name, Arc::new(source), schema)
    }

    /// Bind an input to an already shared source
    pub fn from_source(
        name: impl Into<String>,
        source: Arc<dyn Source>,
        schema: ArgumentSchema,
    ) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::External { source, schema },
        }
    }

    /// Bind an input to one environment argument, passed through unchanged
    pub fn from_argument(name: impl Into<String>, argument: &str, arg_type: ArgType) -> Self {
        let arg = argument.to_string();
        let schema = ArgumentSchema::new().with_arg(arg.clone(), ArgumentDef::required(arg_type));
        Self::external(
            name,
            move |args: &Map<String, Value>| {
                args.get(&arg)
                    .cloned()
                    .ok_or_else(|| SourceError::new(format!("argument '{}' not supplied", arg)))
            },
            schema,
        )
    }

    /// Bind an input to the output of the node called `depends_on`
    pub fn dependency(name: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::Dependency {
                depends_on: depends_on.into(),
            },
        }
    }

    /// Ordering-only dependency on `node`; the input is named after the node
    pub fn dependency_only(node: &Node) -> Self {
        Self::dependency(node.name(), node.name())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Name of the upstream node for dependency bindings
    pub fn depends_on(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::Dependency { depends_on } => Some(depends_on),
            BindingKind::External { .. } => None,
        }
    }
}
