// SPDX-License-Identifier: MIT

//! Typed error handling for taskgraph-rs
//!
//! Construction-time errors (`NodeError`, `GraphError`) are returned as `Err`
//! and stop a graph from ever being built. Execution-time errors
//! (`InputResolutionFailure`, `TransformFailure`) are never returned by the
//! executor; they are recorded on the per-node result instead.

use thiserror::Error;

/// Top-level error type for taskgraph-rs
#[derive(Debug, Error)]
pub enum TaskGraphError {
    /// Node construction errors
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// Graph construction errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Graph-list configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization errors, e.g. while exporting a run result
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while constructing a single node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Node name must not be empty")]
    EmptyName,

    /// Two input bindings on the same node share a name
    #[error("Node '{node}' declares input '{input}' more than once")]
    DuplicateInputName { node: String, input: String },
}

/// Errors raised while constructing a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two nodes in the same graph share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNodeName(String),

    /// A dependency binding references a node that is not in the graph
    #[error("Node '{node}' input '{input}' depends on unknown node '{depends_on}'")]
    UnresolvedDependency {
        node: String,
        input: String,
        depends_on: String,
    },

    /// The dependency edges contain a cycle; `path` starts and ends on the same node
    #[error("Cyclic dependency detected: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// A node handed to the graph could not be constructed
    #[error("Invalid node: {0}")]
    InvalidNode(#[from] NodeError),
}

/// Graph-list configuration errors. All are fatal before any graph runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is malformed
    #[error("Invalid pipelines document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No factory is registered under `module.function`
    #[error("No factory registered for {module}.{function}")]
    UnknownFactory { module: String, function: String },

    /// A factory ran but could not build its graph
    #[error("Factory {key} failed: {source}")]
    Graph {
        key: String,
        #[source]
        source: GraphError,
    },

    /// Two entries produced graphs with the same name
    #[error("Duplicate graph name: {0}")]
    DuplicateGraph(String),

    #[error("Graph '{0}' not found")]
    GraphNotFound(String),
}

/// Error returned by a node transform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for TransformError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TransformError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Error returned by an external source procedure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for SourceError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Error returned by a materialization strategy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MaterializationError {
    pub message: String,
}

impl MaterializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a node's inputs could not be resolved. The transform was never invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputResolutionFailure {
    /// A required argument of an external source is absent from the environment
    #[error("input '{input}' is missing required argument '{argument}'")]
    MissingArgument { input: String, argument: String },

    /// An argument is present but does not match its declared type
    #[error("input '{input}' argument '{argument}' expected {expected}, got {actual}")]
    ArgumentTypeMismatch {
        input: String,
        argument: String,
        expected: String,
        actual: String,
    },

    /// The external source procedure itself failed
    #[error("input '{input}' source failed: {message}")]
    SourceFailed { input: String, message: String },

    /// The upstream node did not produce a value
    #[error("input '{input}' depends on '{upstream}', which did not succeed")]
    UpstreamFailed { input: String, upstream: String },

    /// The run was aborted at `node` before this node was reached
    #[error("run aborted at '{node}' before this node ran")]
    RunAborted { node: String },
}

/// Why an attempted node failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformFailure {
    /// The transform returned an error
    #[error("transform failed: {0}")]
    Transform(TransformError),

    /// The transform succeeded but its output could not be materialized
    #[error("materialization '{strategy}' failed: {message}")]
    Materialization { strategy: String, message: String },

    /// The transform panicked; this aborts the run and the remaining nodes
    /// are recorded as `RunAborted`
    #[error("transform panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_path() {
        let err = GraphError::CyclicDependency {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn test_unresolved_dependency_message() {
        let err = GraphError::UnresolvedDependency {
            node: "two".to_string(),
            input: "x".to_string(),
            depends_on: "ghost".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Node 'two' input 'x' depends on unknown node 'ghost'"
        );
    }

    #[test]
    fn test_transform_error_from_str() {
        let err: TransformError = "boom".into();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            TransformFailure::Transform(err).to_string(),
            "transform failed: boom"
        );
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::UnknownFactory {
            module: "demos".to_string(),
            function: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "No factory registered for demos.missing");

        let err: TaskGraphError = ConfigError::GraphNotFound("etl".to_string()).into();
        assert_eq!(err.to_string(), "Configuration error: Graph 'etl' not found");
    }

    #[test]
    fn test_run_aborted_message() {
        let err = InputResolutionFailure::RunAborted {
            node: "explodes".to_string(),
        };
        assert_eq!(err.to_string(), "run aborted at 'explodes' before this node ran");
    }

    #[test]
    fn test_top_level_wraps_graph_error() {
        let err: TaskGraphError = GraphError::CyclicDependency {
            path: vec!["x".to_string(), "x".to_string()],
        }
        .into();
        assert!(matches!(
            err,
            TaskGraphError::Graph(GraphError::CyclicDependency { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Graph error: Cyclic dependency detected: x -> x"
        );
    }
}
