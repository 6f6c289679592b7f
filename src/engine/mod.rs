// SPDX-License-Identifier: MIT

//! Execution engine - nodes, graphs and the executor
//!
//! This module provides:
//! - `Node` / `InputBinding` - units of work and where their inputs come from
//! - `Graph` - validated, acyclic node collections with a deterministic order
//! - `execute` - runs a graph and aggregates a `RunResult`

pub mod context;
pub mod environment;
pub mod error;
pub mod executor;
pub mod graph;
pub mod input;
pub mod node;
pub mod result;

pub use context::ExecutionContext;
pub use environment::Environment;
pub use error::{
    ConfigError, GraphError, InputResolutionFailure, MaterializationError, NodeError,
    SourceError, TaskGraphError, TransformError, TransformFailure,
};
pub use executor::{execute, Executor};
pub use graph::Graph;
pub use input::{ArgType, ArgumentDef, ArgumentSchema, BindingKind, InputBinding, Source};
pub use node::{Inputs, LogMaterializer, Materializer, Node, OutputDef, Transform};
pub use result::{AbortRecord, NodeOutcome, NodeResult, RunResult};
