//! Graph rendering - text listings and Graphviz DOT
//!
//! Only the public graph structure is used: node names, bindings and
//! dependency edges.

use std::fmt::Write;

use crate::engine::{BindingKind, Graph, Node};

/// Text listing of `graph` in execution order. `full` adds inputs and outputs per node.
pub fn print_graph(graph: &Graph, full: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Graph: {}", graph.name());
    if let Some(description) = graph.description() {
        let _ = writeln!(out, "  {}", description);
    }
    let _ = writeln!(out, "Nodes ({}):", graph.len());

    for node in graph.execution_order() {
        if full {
            write_node_full(&mut out, node);
            continue;
        }
        let deps: Vec<&str> = node.dependencies().collect();
        if deps.is_empty() {
            let _ = writeln!(out, "  {}", node.name());
        } else {
            let _ = writeln!(out, "  {} <- {}", node.name(), deps.join(", "));
        }
    }

    out
}

fn write_node_full(out: &mut String, node: &Node) {
    let _ = writeln!(out, "  Node: {}", node.name());
    if let Some(description) = node.description() {
        let _ = writeln!(out, "    Description: {}", description);
    }

    if node.inputs().is_empty() {
        let _ = writeln!(out, "    Inputs: none");
    } else {
        let _ = writeln!(out, "    Inputs:");
        for input in node.inputs() {
            match input.kind() {
                BindingKind::Dependency { depends_on } => {
                    let _ = writeln!(out, "      {}: output of {}", input.name(), depends_on);
                }
                BindingKind::External { schema, .. } => {
                    let args: Vec<String> = schema
                        .args
                        .iter()
                        .map(|(name, def)| {
                            let req = if def.required { "" } else { "?" };
                            format!("{}{}: {}", name, req, def.arg_type)
                        })
                        .collect();
                    let _ = writeln!(out, "      {}: external ({})", input.name(), args.join(", "));
                }
            }
        }
    }

    match node.output().strategy() {
        Some(strategy) => {
            let _ = writeln!(out, "    Output: materialized ({})", strategy);
        }
        None => {
            let _ = writeln!(out, "    Output: not materialized");
        }
    }
}

/// Graphviz DOT digraph with one edge per dependency, pointing downstream
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quote(graph.name()));
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  node [shape=box];");

    for node in graph.nodes() {
        let _ = writeln!(out, "  {};", quote(node.name()));
    }
    for (from, to) in graph.edges() {
        let _ = writeln!(out, "  {} -> {};", quote(from), quote(to));
    }

    out.push_str("}\n");
    out
}

fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}
