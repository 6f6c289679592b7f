// SPDX-License-Identifier: MIT

//! Graph executor
//!
//! Runs every node of a graph once, in topological order, on the calling
//! thread. Failures never escape `execute`: they are recorded per node, and a
//! node whose upstream did not succeed is recorded as a resolution failure
//! without its transform being invoked.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use super::context::ExecutionContext;
use super::environment::Environment;
use super::error::{InputResolutionFailure, TransformFailure};
use super::graph::Graph;
use super::input::BindingKind;
use super::node::{Inputs, Node, OutputDef};
use super::result::{AbortRecord, NodeOutcome, NodeResult, RunResult};

thread_local! {
    static IN_TRANSFORM: Cell<bool> = const { Cell::new(false) };
}

/// Panics inside a transform are recorded on the node, so they are logged at
/// debug level instead of reaching the previously installed hook.
static QUIET_PANIC_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if IN_TRANSFORM.with(|flag| flag.get()) {
            log::debug!("Transform panicked: {}", info);
        } else {
            previous(info);
        }
    }));
});

/// Execute `graph` once with the given context and environment
pub fn execute(context: &ExecutionContext, graph: &Graph, environment: &Environment) -> RunResult {
    Executor::new(context, environment).run(graph)
}

/// Executes graphs against one context and environment
pub struct Executor<'a> {
    context: &'a ExecutionContext,
    environment: &'a Environment,
}

impl<'a> Executor<'a> {
    pub fn new(context: &'a ExecutionContext, environment: &'a Environment) -> Self {
        Self {
            context,
            environment,
        }
    }

    pub fn run(&self, graph: &Graph) -> RunResult {
        let mut run = RunResult::new(self.context.run_id(), graph.name());
        self.context.info(&format!(
            "Executing graph '{}' ({} nodes)",
            graph.name(),
            graph.len()
        ));

        // Successful outputs by arena position
        let mut values: Vec<Option<Value>> = vec![None; graph.len()];
        let order = graph.order();

        for (step, &position) in order.iter().enumerate() {
            let node = &graph.nodes()[position];
            let started_at = Utc::now();
            let clock = Instant::now();

            let outcome = match self.resolve_inputs(graph, node, &values) {
                Err(error) => {
                    self.context
                        .warn(&format!("Node {} not run: {}", node.name(), error));
                    NodeOutcome::ResolutionFailed { error }
                }
                Ok(inputs) => match self.invoke(node, &inputs) {
                    Ok(value) => {
                        self.context.info(&format!("Node {} succeeded", node.name()));
                        values[position] = Some(value.clone());
                        NodeOutcome::Succeeded { value }
                    }
                    Err(error) => {
                        self.context
                            .error(&format!("Node {} failed: {}", node.name(), error));
                        NodeOutcome::Failed { error }
                    }
                },
            };

            let abort = match &outcome {
                NodeOutcome::Failed {
                    error: TransformFailure::Panicked(reason),
                } => Some(AbortRecord {
                    node: node.name().to_string(),
                    reason: reason.clone(),
                }),
                _ => None,
            };

            run.record(NodeResult {
                node: node.name().to_string(),
                outcome,
                started_at,
                elapsed_ms: clock.elapsed().as_millis() as u64,
            });

            if let Some(abort) = abort {
                self.context.error(&format!(
                    "Run aborted at node {}: {}",
                    abort.node, abort.reason
                ));
                for &skipped in &order[step + 1..] {
                    run.record(NodeResult {
                        node: graph.nodes()[skipped].name().to_string(),
                        outcome: NodeOutcome::ResolutionFailed {
                            error: InputResolutionFailure::RunAborted {
                                node: abort.node.clone(),
                            },
                        },
                        started_at: Utc::now(),
                        elapsed_ms: 0,
                    });
                }
                run.aborted = Some(abort);
                return run;
            }
        }

        self.context.info(&format!(
            "Graph '{}' finished: {}",
            graph.name(),
            if run.success() { "success" } else { "failure" }
        ));
        run
    }

    /// Resolve every binding of `node` in declared order; the first failure wins
    fn resolve_inputs(
        &self,
        graph: &Graph,
        node: &Node,
        values: &[Option<Value>],
    ) -> Result<Inputs, InputResolutionFailure> {
        let mut inputs = Inputs::new();

        for binding in node.inputs() {
            let value = match binding.kind() {
                BindingKind::Dependency { depends_on } => graph
                    .position(depends_on)
                    .and_then(|p| values[p].clone())
                    .ok_or_else(|| InputResolutionFailure::UpstreamFailed {
                        input: binding.name().to_string(),
                        upstream: depends_on.clone(),
                    })?,
                BindingKind::External { source, schema } => {
                    let available = self.environment.arguments_for(node.name(), binding.name());
                    let args = schema.select(binding.name(), &available)?;
                    source
                        .resolve(&args)
                        .map_err(|e| InputResolutionFailure::SourceFailed {
                            input: binding.name().to_string(),
                            message: e.to_string(),
                        })?
                }
            };
            inputs.push(binding.name(), value);
        }

        log::debug!("Resolved {} inputs for node {}", inputs.len(), node.name());
        Ok(inputs)
    }

    /// Run the transform and, on success, its materializer. Panics are caught
    /// and reported as `TransformFailure::Panicked`.
    fn invoke(&self, node: &Node, inputs: &Inputs) -> Result<Value, TransformFailure> {
        let context = self.context;

        Lazy::force(&QUIET_PANIC_HOOK);
        let outer = IN_TRANSFORM.with(|flag| flag.replace(true));

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Value, TransformFailure> {
            let value = node
                .transform()
                .run(inputs, context)
                .map_err(TransformFailure::Transform)?;

            if let OutputDef::Materialized {
                strategy,
                materializer,
            } = node.output()
            {
                materializer
                    .materialize(node.name(), &value, context)
                    .map_err(|e| TransformFailure::Materialization {
                        strategy: strategy.clone(),
                        message: e.to_string(),
                    })?;
            }

            Ok(value)
        }));

        IN_TRANSFORM.with(|flag| flag.set(outer));

        match attempt {
            Ok(result) => result,
            Err(payload) => Err(TransformFailure::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
