// SPDX-License-Identifier: MIT

//! Run results - per-node outcomes plus an overall success flag

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::error::{InputResolutionFailure, TaskGraphError, TransformFailure};

fn as_message<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Terminal state of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeOutcome {
    /// The transform ran and returned a value
    Succeeded { value: Value },
    /// The transform ran and failed
    Failed {
        #[serde(serialize_with = "as_message")]
        error: TransformFailure,
    },
    /// Inputs could not be resolved; the transform never ran
    ResolutionFailed {
        #[serde(serialize_with = "as_message")]
        error: InputResolutionFailure,
    },
}

/// Result recorded for one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeResult {
    pub node: String,
    #[serde(flatten)]
    pub outcome: NodeOutcome,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl NodeResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, NodeOutcome::Succeeded { .. })
    }

    /// The transform's output, if it succeeded
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            NodeOutcome::Succeeded { value } => Some(value),
            _ => None,
        }
    }

    /// Whether the transform was invoked at all
    pub fn attempted(&self) -> bool {
        !matches!(self.outcome, NodeOutcome::ResolutionFailed { .. })
    }

    /// Failure detail, if any
    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            NodeOutcome::Succeeded { .. } => None,
            NodeOutcome::Failed { error } => Some(error.to_string()),
            NodeOutcome::ResolutionFailed { error } => Some(error.to_string()),
        }
    }
}

/// Record of a fatal abort that stopped the run early
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortRecord {
    pub node: String,
    pub reason: String,
}

/// Outcome of executing one graph
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub graph: String,
    /// Per-node results in execution order
    pub results: Vec<NodeResult>,
    pub aborted: Option<AbortRecord>,
}

impl RunResult {
    pub(crate) fn new(run_id: Uuid, graph: impl Into<String>) -> Self {
        Self {
            run_id,
            graph: graph.into(),
            results: Vec::new(),
            aborted: None,
        }
    }

    pub(crate) fn record(&mut self, result: NodeResult) {
        self.results.push(result);
    }

    /// True iff every node succeeded and the run was not aborted
    pub fn success(&self) -> bool {
        self.aborted.is_none() && self.results.iter().all(|r| r.success())
    }

    pub fn result_for(&self, node: &str) -> Option<&NodeResult> {
        self.results.iter().find(|r| r.node == node)
    }

    /// Output value of `node`, if it succeeded
    pub fn value(&self, node: &str) -> Option<&Value> {
        self.result_for(node).and_then(|r| r.value())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &NodeResult> {
        self.results.iter().filter(|r| r.success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeResult> {
        self.results.iter().filter(|r| !r.success())
    }

    /// Human-readable report, one line per node
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Run {} of '{}': {}\n",
            self.run_id,
            self.graph,
            if self.success() { "SUCCESS" } else { "FAILURE" }
        );

        for r in &self.results {
            match &r.outcome {
                NodeOutcome::Succeeded { .. } => {
                    out.push_str(&format!("  [ok]   {} ({} ms)\n", r.node, r.elapsed_ms));
                }
                NodeOutcome::Failed { error } => {
                    out.push_str(&format!("  [fail] {}: {}\n", r.node, error));
                }
                NodeOutcome::ResolutionFailed { error } => {
                    out.push_str(&format!("  [skip] {}: {}\n", r.node, error));
                }
            }
        }

        if let Some(abort) = &self.aborted {
            out.push_str(&format!("  aborted at {}: {}\n", abort.node, abort.reason));
        }

        out
    }

    /// JSON report: the run's fields plus the overall `success` flag
    pub fn to_json(&self) -> Result<Value, TaskGraphError> {
        Ok(serde_json::to_value(RunReport {
            success: self.success(),
            run: self,
        })?)
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    success: bool,
    #[serde(flatten)]
    run: &'a RunResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::TransformError;
    use serde_json::json;

    fn result(node: &str, outcome: NodeOutcome) -> NodeResult {
        NodeResult {
            node: node.to_string(),
            outcome,
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    fn sample() -> RunResult {
        let mut run = RunResult::new(Uuid::new_v4(), "sample");
        run.record(result("a", NodeOutcome::Succeeded { value: json!(1) }));
        run.record(result(
            "b",
            NodeOutcome::Failed {
                error: TransformFailure::Transform(TransformError::new("boom")),
            },
        ));
        run.record(result(
            "c",
            NodeOutcome::ResolutionFailed {
                error: InputResolutionFailure::UpstreamFailed {
                    input: "b".to_string(),
                    upstream: "b".to_string(),
                },
            },
        ));
        run
    }

    #[test]
    fn test_empty_run_succeeds() {
        let run = RunResult::new(Uuid::new_v4(), "empty");
        assert!(run.success());
        assert!(run.results.is_empty());
    }

    #[test]
    fn test_success_is_conjunction() {
        let run = sample();
        assert!(!run.success());
        assert_eq!(run.succeeded().count(), 1);
        assert_eq!(run.failed().map(|r| r.node.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_abort_fails_run() {
        let mut run = RunResult::new(Uuid::new_v4(), "aborted");
        run.record(result("a", NodeOutcome::Succeeded { value: json!(1) }));
        run.aborted = Some(AbortRecord {
            node: "b".to_string(),
            reason: "panic".to_string(),
        });
        assert!(!run.success());
        assert!(run.summary().contains("aborted at b: panic"));
    }

    #[test]
    fn test_attempted_distinguishes_upstream_failure() {
        let run = sample();
        assert!(run.result_for("b").unwrap().attempted());
        assert!(!run.result_for("c").unwrap().attempted());
        assert_eq!(run.value("a"), Some(&json!(1)));
        assert_eq!(run.value("b"), None);
    }

    #[test]
    fn test_summary_lines() {
        let summary = sample().summary();
        assert!(summary.contains("'sample': FAILURE"));
        assert!(summary.contains("[ok]   a"));
        assert!(summary.contains("[fail] b: transform failed: boom"));
        assert!(summary.contains("[skip] c: input 'b' depends on 'b', which did not succeed"));
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json().unwrap();
        assert_eq!(json["graph"], "sample");
        assert_eq!(json["success"], false);
        assert_eq!(json["aborted"], Value::Null);
        assert_eq!(json["results"][0]["status"], "succeeded");
        assert_eq!(json["results"][0]["value"], 1);
        assert_eq!(json["results"][1]["status"], "failed");
        assert_eq!(json["results"][1]["error"], "transform failed: boom");
        assert_eq!(json["results"][2]["status"], "resolution_failed");
        assert_eq!(
            json["results"][2]["error"],
            "input 'b' depends on 'b', which did not succeed"
        );
        assert!(json["results"][1].get("value").is_none());
        assert!(json["results"][0]["started_at"].is_string());
    }

    #[test]
    fn test_to_json_abort_record() {
        let mut run = sample();
        run.aborted = Some(AbortRecord {
            node: "b".to_string(),
            reason: "kaboom".to_string(),
        });
        let json = run.to_json().unwrap();
        assert_eq!(json["aborted"]["node"], "b");
        assert_eq!(json["aborted"]["reason"], "kaboom");
        assert_eq!(json["run_id"], run.run_id.to_string());
    }
}
