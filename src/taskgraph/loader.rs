//! Pipelines loader - YAML loading and graph construction
//!
//! Reads a pipelines document and turns each entry into graphs through the
//! factory registry. Any bad entry fails the whole load before anything runs.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::config::PipelinesConfig;
use super::registry::GraphRegistry;
use crate::engine::{ConfigError, Graph};

pub struct PipelineLoader;

impl PipelineLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a pipelines document from a YAML file
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<PipelinesConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_yaml(&content)
    }

    /// Parse a pipelines document from a YAML string
    pub fn parse_yaml(content: &str) -> Result<PipelinesConfig, ConfigError> {
        let config: PipelinesConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Resolve every entry through `registry`, in document order
    pub fn create_graphs(
        &self,
        config: &PipelinesConfig,
        registry: &GraphRegistry,
    ) -> Result<Vec<Graph>, ConfigError> {
        let mut graphs = Vec::new();
        let mut names = HashSet::new();

        for entry in &config.pipelines {
            for graph in registry.resolve(&entry.module, &entry.function)? {
                if !names.insert(graph.name().to_string()) {
                    return Err(ConfigError::DuplicateGraph(graph.name().to_string()));
                }
                log::info!("Loaded graph '{}' from {}", graph.name(), entry.key());
                graphs.push(graph);
            }
        }

        Ok(graphs)
    }

    /// Load a document and build its graphs
    pub fn load_graphs<P: AsRef<Path>>(
        &self,
        path: P,
        registry: &GraphRegistry,
    ) -> Result<Vec<Graph>, ConfigError> {
        let config = self.load_config(path)?;
        self.create_graphs(&config, registry)
    }
}

impl Default for PipelineLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a graph by name
pub fn find_graph<'a>(graphs: &'a [Graph], name: &str) -> Result<&'a Graph, ConfigError> {
    graphs
        .iter()
        .find(|g| g.name() == name)
        .ok_or_else(|| ConfigError::GraphNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Node;
    use crate::taskgraph::config::PipelineEntry;
    use serde_json::Value;
    use std::io::Write;

    fn registry() -> GraphRegistry {
        let mut registry = GraphRegistry::new();
        registry.register("jobs", "alpha", || {
            let node = Node::no_args("step", vec![], || Ok(Value::Null)).unwrap();
            Ok(Graph::build("alpha", vec![node])?.into())
        });
        registry.register("jobs", "beta", || Ok(Graph::build("beta", vec![])?.into()));
        registry.register("jobs", "alpha_again", || {
            Ok(Graph::build("alpha", vec![])?.into())
        });
        registry
    }

    #[test]
    fn test_parse_and_create() {
        let yaml = r#"
pipelines:
  - module: jobs
    fn: beta
  - module: jobs
    fn: alpha
"#;
        let config = PipelineLoader::parse_yaml(yaml).unwrap();
        let graphs = PipelineLoader::new()
            .create_graphs(&config, &registry())
            .unwrap();

        let names: Vec<&str> = graphs.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
        assert_eq!(find_graph(&graphs, "alpha").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_function_fails_whole_load() {
        let yaml = r#"
pipelines:
  - module: jobs
    fn: alpha
  - module: jobs
    fn: gamma
"#;
        let config = PipelineLoader::parse_yaml(yaml).unwrap();
        let err = PipelineLoader::new()
            .create_graphs(&config, &registry())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownFactory { ref function, .. } if function == "gamma"
        ));
    }

    #[test]
    fn test_duplicate_graph_names() {
        let config = PipelinesConfig {
            pipelines: vec![
                PipelineEntry::new("jobs", "alpha"),
                PipelineEntry::new("jobs", "alpha_again"),
            ],
        };
        let err = PipelineLoader::new()
            .create_graphs(&config, &registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateGraph(ref name) if name == "alpha"));
    }

    #[test]
    fn test_find_graph_missing() {
        let err = find_graph(&[], "nope").unwrap_err();
        assert!(matches!(err, ConfigError::GraphNotFound(_)));
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
pipelines: "not a list"
"#;
        let result = PipelineLoader::parse_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_graphs_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipelines:\n  - module: jobs\n    fn: beta").unwrap();

        let graphs = PipelineLoader::new()
            .load_graphs(file.path(), &registry())
            .unwrap();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].name(), "beta");
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineLoader::new()
            .load_config("/definitely/not/here/pipelines.yml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
