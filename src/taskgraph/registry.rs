// SPDX-License-Identifier: MIT

//! Graph factory registry
//!
//! Maps `(module, function)` pairs to zero-argument factories. The pipelines
//! document names factories by these pairs; the registry is populated at
//! process start. Module names may be dotted, so the pair is never joined
//! into a single lookup key.

use std::collections::HashMap;
use std::sync::Arc;

use super::config::factory_key;
use crate::engine::{ConfigError, Graph, GraphError};

/// What a factory produces: one graph or several
#[derive(Debug, Clone)]
pub enum Produced {
    Single(Graph),
    Many(Vec<Graph>),
}

impl Produced {
    pub fn into_graphs(self) -> Vec<Graph> {
        match self {
            Produced::Single(g) => vec![g],
            Produced::Many(gs) => gs,
        }
    }
}

impl From<Graph> for Produced {
    fn from(graph: Graph) -> Self {
        Produced::Single(graph)
    }
}

impl From<Vec<Graph>> for Produced {
    fn from(graphs: Vec<Graph>) -> Self {
        Produced::Many(graphs)
    }
}

pub type GraphFactory = Arc<dyn Fn() -> Result<Produced, GraphError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct GraphRegistry {
    factories: HashMap<(String, String), GraphFactory>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `(module, function)`; a later registration replaces an earlier one
    pub fn register<F>(&mut self, module: &str, function: &str, factory: F)
    where
        F: Fn() -> Result<Produced, GraphError> + Send + Sync + 'static,
    {
        log::debug!("Registered graph factory: {}", factory_key(module, function));
        self.factories.insert(
            (module.to_string(), function.to_string()),
            Arc::new(factory),
        );
    }

    pub fn contains(&self, module: &str, function: &str) -> bool {
        self.factory(module, function).is_some()
    }

    /// Registered `(module, function)` pairs, sorted
    pub fn keys(&self) -> Vec<(&str, &str)> {
        let mut keys: Vec<(&str, &str)> = self
            .factories
            .keys()
            .map(|(m, f)| (m.as_str(), f.as_str()))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Look up and invoke the factory for `(module, function)`
    pub fn resolve(&self, module: &str, function: &str) -> Result<Vec<Graph>, ConfigError> {
        let factory = self
            .factory(module, function)
            .ok_or_else(|| ConfigError::UnknownFactory {
                module: module.to_string(),
                function: function.to_string(),
            })?;

        let produced = factory().map_err(|source| ConfigError::Graph {
            key: factory_key(module, function),
            source,
        })?;
        Ok(produced.into_graphs())
    }

    fn factory(&self, module: &str, function: &str) -> Option<&GraphFactory> {
        self.factories.get(&(module.to_string(), function.to_string()))
    }
}
