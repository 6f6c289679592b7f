// SPDX-License-Identifier: MIT

//! Application layer - graph lists from configuration and graph rendering
//!
//! This module provides:
//! - `GraphRegistry` - `module.function` keys mapped to graph factories
//! - `PipelineLoader` - builds graphs from a YAML pipelines document
//! - `render` - text and Graphviz DOT views of a graph

pub mod config;
pub mod demos;
pub mod loader;
pub mod registry;
pub mod render;

pub use config::{PipelineEntry, PipelinesConfig};
pub use loader::{find_graph, PipelineLoader};
pub use registry::{GraphFactory, GraphRegistry, Produced};
