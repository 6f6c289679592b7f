// SPDX-License-Identifier: MIT

//! Node - the atomic unit of work
//!
//! A node is pure data plus one callable: a name, ordered input bindings, an
//! output contract and a transform. It knows nothing about the graph it will
//! join, so node-name uniqueness is checked by `Graph::build`.

use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::context::ExecutionContext;
use super::error::{MaterializationError, NodeError, TransformError};
use super::input::InputBinding;

/// Resolved input values in binding order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: Vec<(String, Value)>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Like `get`, but a missing input is a transform error
    pub fn require(&self, name: &str) -> Result<&Value, TransformError> {
        self.get(name)
            .ok_or_else(|| TransformError::new(format!("missing input '{}'", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// The work a node performs
pub trait Transform: Send + Sync {
    fn run(&self, inputs: &Inputs, context: &ExecutionContext) -> Result<Value, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&Inputs, &ExecutionContext) -> Result<Value, TransformError> + Send + Sync,
{
    fn run(&self, inputs: &Inputs, context: &ExecutionContext) -> Result<Value, TransformError> {
        self(inputs, context)
    }
}

/// Persists a node's output value under a named strategy
pub trait Materializer: Send + Sync {
    fn materialize(
        &self,
        node: &str,
        value: &Value,
        context: &ExecutionContext,
    ) -> Result<(), MaterializationError>;
}

/// Writes the output value to the log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMaterializer;

impl Materializer for LogMaterializer {
    fn materialize(
        &self,
        node: &str,
        value: &Value,
        context: &ExecutionContext,
    ) -> Result<(), MaterializationError> {
        context.info(&format!("materialized {}: {}", node, value));
        Ok(())
    }
}

/// Output contract of a node
#[derive(Clone, Default)]
pub enum OutputDef {
    /// The value lives only in the run result
    #[default]
    NoMaterialization,
    /// The value is handed to `materializer` after a successful transform
    Materialized {
        strategy: String,
        materializer: Arc<dyn Materializer>,
    },
}

impl OutputDef {
    pub fn materialized(strategy: impl Into<String>, materializer: Arc<dyn Materializer>) -> Self {
        OutputDef::Materialized {
            strategy: strategy.into(),
            materializer,
        }
    }

    /// Materialize through the log
    pub fn logged() -> Self {
        Self::materialized("log", Arc::new(LogMaterializer))
    }

    pub fn strategy(&self) -> Option<&str> {
        match self {
            OutputDef::NoMaterialization => None,
            OutputDef::Materialized { strategy, .. } => Some(strategy),
        }
    }
}

impl fmt::Debug for OutputDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDef::NoMaterialization => write!(f, "NoMaterialization"),
            OutputDef::Materialized { strategy, .. } => f
                .debug_struct("Materialized")
                .field("strategy", strategy)
                .finish_non_exhaustive(),
        }
    }
}

/// A named processing step
#[derive(Clone)]
pub struct Node {
    name: String,
    description: Option<String>,
    inputs: Vec<InputBinding>,
    output: OutputDef,
    transform: Arc<dyn Transform>,
}

impl Node {
    /// Create a node from a transform closure
    pub fn new<F>(
        name: impl Into<String>,
        inputs: Vec<InputBinding>,
        output: OutputDef,
        transform: F,
    ) -> Result<Self, NodeError>
    where
        F: Fn(&Inputs, &ExecutionContext) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::from_transform(name, inputs, output, Arc::new(transform))
    }

    /// Create a node from a shared transform
    pub fn from_transform(
        name: impl Into<String>,
        inputs: Vec<InputBinding>,
        output: OutputDef,
        transform: Arc<dyn Transform>,
    ) -> Result<Self, NodeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NodeError::EmptyName);
        }

        let mut seen = HashSet::new();
        for input in &inputs {
            if !seen.insert(input.name()) {
                return Err(NodeError::DuplicateInputName {
                    node: name,
                    input: input.name().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            description: None,
            inputs,
            output,
            transform,
        })
    }

    /// A node whose transform ignores its inputs; they only order execution
    pub fn no_args<F>(
        name: impl Into<String>,
        inputs: Vec<InputBinding>,
        transform: F,
    ) -> Result<Self, NodeError>
    where
        F: Fn() -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::new(
            name,
            inputs,
            OutputDef::NoMaterialization,
            move |_: &Inputs, _: &ExecutionContext| transform(),
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn inputs(&self) -> &[InputBinding] {
        &self.inputs
    }

    pub fn output(&self) -> &OutputDef {
        &self.output
    }

    pub fn transform(&self) -> &Arc<dyn Transform> {
        &self.transform
    }

    /// Names of the nodes this node depends on, in binding order
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|i| i.depends_on())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
