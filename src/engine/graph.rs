// SPDX-License-Identifier: MIT

//! Graph - a validated, acyclic collection of nodes
//!
//! Nodes are stored in an arena in declared order; dependency edges are index
//! lists into that arena. All validation happens in `Graph::build`, so a graph
//! that exists can always be executed.

use std::collections::{BTreeSet, HashMap};

use super::error::GraphError;
use super::node::Node;

/// Traversal state for cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    description: Option<String>,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    /// Upstream node indices per node, deduplicated, in binding order
    upstream: Vec<Vec<usize>>,
    /// Downstream node indices per node, in declared order
    downstream: Vec<Vec<usize>>,
    /// Topological order, ties broken by declared order
    order: Vec<usize>,
}

impl Graph {
    /// Validate `nodes` and build a graph.
    ///
    /// Fails with `DuplicateNodeName`, `UnresolvedDependency` or
    /// `CyclicDependency`, checked in that order.
    pub fn build(name: impl Into<String>, nodes: Vec<Node>) -> Result<Self, GraphError> {
        let name = name.into();

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name().to_string(), i).is_some() {
                return Err(GraphError::DuplicateNodeName(node.name().to_string()));
            }
        }

        let mut upstream: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for input in node.inputs() {
                let Some(dep_name) = input.depends_on() else {
                    continue;
                };
                let Some(&dep) = index.get(dep_name) else {
                    return Err(GraphError::UnresolvedDependency {
                        node: node.name().to_string(),
                        input: input.name().to_string(),
                        depends_on: dep_name.to_string(),
                    });
                };
                if !upstream[i].contains(&dep) {
                    upstream[i].push(dep);
                    downstream[dep].push(i);
                }
            }
        }

        if let Some(cycle) = find_cycle(&upstream) {
            return Err(GraphError::CyclicDependency {
                path: cycle
                    .into_iter()
                    .map(|i| nodes[i].name().to_string())
                    .collect(),
            });
        }

        for list in &mut downstream {
            list.sort_unstable();
        }
        let order = topological_order(&upstream, &downstream);

        log::debug!(
            "Built graph '{}' with {} nodes, order: {:?}",
            name,
            nodes.len(),
            order.iter().map(|&i| nodes[i].name()).collect::<Vec<_>>()
        );

        Ok(Self {
            name,
            description: None,
            nodes,
            index,
            upstream,
            downstream,
            order,
        })
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

    /// Nodes in declared order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in the order the executor runs them
    pub fn execution_order(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    /// Arena positions in execution order
    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Arena position of `name`
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Direct dependencies of `name`
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, &self.upstream)
    }

    /// Nodes that directly depend on `name`
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, &self.downstream)
    }

    /// Dependency edges as `(dependency, dependent)` pairs, grouped by dependent
    /// in declared order
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.upstream
            .iter()
            .enumerate()
            .flat_map(|(to, froms)| {
                froms
                    .iter()
                    .map(move |&from| (self.nodes[from].name(), self.nodes[to].name()))
            })
            .collect()
    }

    fn neighbours<'a>(&'a self, name: &str, lists: &'a [Vec<usize>]) -> Vec<&'a str> {
        match self.index.get(name) {
            Some(&i) => lists[i].iter().map(|&j| self.nodes[j].name()).collect(),
            None => vec![],
        }
    }
}

/// Iterative depth-first search over upstream edges. Returns the node indices
/// of the first cycle found, starting and ending on the same node.
fn find_cycle(upstream: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; upstream.len()];

    for root in 0..upstream.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        // (node, index of the next upstream edge to follow)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::OnPath;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&dep) = upstream[node].get(top.1) {
                top.1 += 1;
                match marks[dep] {
                    Mark::Unvisited => {
                        marks[dep] = Mark::OnPath;
                        stack.push((dep, 0));
                    }
                    Mark::OnPath => {
                        let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        let mut path: Vec<usize> = stack[start..].iter().map(|&(n, _)| n).collect();
                        path.push(dep);
                        return Some(path);
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    None
}

/// Kahn's algorithm; among ready nodes the lowest declared index goes first.
/// Callers guarantee the graph is acyclic.
fn topological_order(upstream: &[Vec<usize>], downstream: &[Vec<usize>]) -> Vec<usize> {
    let mut remaining: Vec<usize> = upstream.iter().map(|deps| deps.len()).collect();
    let mut ready: BTreeSet<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(upstream.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &downstream[next] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputBinding;
    use crate::engine::node::Node;
    use serde_json::Value;

    fn node(name: &str, deps: &[&str]) -> Node {
        let inputs = deps
            .iter()
            .map(|d| InputBinding::dependency(*d, *d))
            .collect();
        Node::no_args(name, inputs, || Ok(Value::Null)).unwrap()
    }

    fn order(graph: &Graph) -> Vec<&str> {
        graph.execution_order().map(|n| n.name()).collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::build("empty", vec![]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(order(&graph), Vec::<&str>::new());
    }

    #[test]
    fn test_dependency_runs_before_dependent() {
        // Declared dependent-first; order must still put the dependency first
        let graph = Graph::build("g", vec![node("b", &["a"]), node("a", &[])]).unwrap();
        assert_eq!(order(&graph), vec!["a", "b"]);
    }

    #[test]
    fn test_independent_nodes_keep_declared_order() {
        let graph = Graph::build(
            "g",
            vec![node("z", &[]), node("m", &[]), node("a", &[])],
        )
        .unwrap();
        assert_eq!(order(&graph), vec!["z", "m", "a"]);
    }

    #[test]
    fn test_diamond_tie_break() {
        let graph = Graph::build(
            "diamond",
            vec![
                node("sink", &["left", "right"]),
                node("right", &["root"]),
                node("left", &["root"]),
                node("root", &[]),
            ],
        )
        .unwrap();
        assert_eq!(order(&graph), vec!["root", "right", "left", "sink"]);
        assert_eq!(graph.dependencies("sink"), vec!["left", "right"]);
        assert_eq!(graph.dependents("root"), vec!["right", "left"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let make = || {
            vec![
                node("c", &["a"]),
                node("b", &[]),
                node("a", &[]),
                node("d", &["b", "c"]),
            ]
        };
        let first = Graph::build("g", make()).unwrap();
        let second = Graph::build("g", make()).unwrap();
        assert_eq!(order(&first), order(&second));
        assert_eq!(order(&first), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_duplicate_node_name() {
        let err = Graph::build("g", vec![node("a", &[]), node("a", &[])]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNodeName("a".to_string()));
    }

    #[test]
    fn test_unresolved_dependency() {
        let err = Graph::build("g", vec![node("a", &["ghost"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedDependency {
                node: "a".to_string(),
                input: "ghost".to_string(),
                depends_on: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_two_node_cycle() {
        let err = Graph::build("g", vec![node("a", &["b"]), node("b", &["a"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            }
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = Graph::build("g", vec![node("a", &["a"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                path: vec!["a".to_string(), "a".to_string()],
            }
        );
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        let err = Graph::build(
            "g",
            vec![
                node("entry", &[]),
                node("x", &["entry", "z"]),
                node("y", &["x"]),
                node("z", &["y"]),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                path: vec![
                    "x".to_string(),
                    "z".to_string(),
                    "y".to_string(),
                    "x".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let a = node("a", &[]);
        let b = Node::no_args(
            "b",
            vec![
                InputBinding::dependency("first", "a"),
                InputBinding::dependency("second", "a"),
            ],
            || Ok(Value::Null),
        )
        .unwrap();

        let graph = Graph::build("g", vec![a, b]).unwrap();
        assert_eq!(graph.edges(), vec![("a", "b")]);
    }

    #[test]
    fn test_positions_follow_declared_order() {
        let graph = Graph::build("g", vec![node("b", &["a"]), node("a", &[])]).unwrap();
        assert_eq!(graph.position("b"), Some(0));
        assert_eq!(graph.position("a"), Some(1));
        assert_eq!(graph.position("missing"), None);
        assert_eq!(graph.order(), &[1, 0]);
    }

    #[test]
    fn test_node_lookup() {
        let graph = Graph::build("g", vec![node("a", &[])])
            .unwrap()
            .with_description("lookup");
        assert_eq!(graph.name(), "g");
        assert_eq!(graph.description(), Some("lookup"));
        assert!(graph.node("a").is_some());
        assert!(graph.node("b").is_none());
        assert!(graph.dependencies("b").is_empty());
    }
}
