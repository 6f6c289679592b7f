// SPDX-License-Identifier: MIT

//! Run-scoped execution context shared by every transform in a run

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Immutable state for one run. Transforms receive it by shared reference.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    tags: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            tags: BTreeMap::new(),
        }
    }

    /// Attach a tag; tags are included in every log line emitted through the context
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|s| s.as_str())
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn debug(&self, message: &str) {
        log::debug!("[run {}]{} {}", self.run_id, self.tag_suffix(), message);
    }

    pub fn info(&self, message: &str) {
        log::info!("[run {}]{} {}", self.run_id, self.tag_suffix(), message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!("[run {}]{} {}", self.run_id, self.tag_suffix(), message);
    }

    pub fn error(&self, message: &str) {
        log::error!("[run {}]{} {}", self.run_id, self.tag_suffix(), message);
    }

    fn tag_suffix(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!(" {}={}", k, v))
            .collect()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
