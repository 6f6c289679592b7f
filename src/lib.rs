// SPDX-License-Identifier: MIT

//! taskgraph-rs - dependency-graph task execution
//!
//! `engine` holds the node/graph execution model; `taskgraph` holds the
//! configuration-driven graph loading and rendering used by the CLI.

pub mod engine;
pub mod taskgraph;

pub use engine::{
    execute, Environment, ExecutionContext, Graph, InputBinding, Node, OutputDef, RunResult,
};
