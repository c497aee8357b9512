//! Bounded execution history.

use super::value_objects::ToolOutput;
use crate::core::clock::now_millis;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How an invocation's lifecycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// Ran (successfully or not)
    Complete,
    Rejected,
    ApprovalTimeout,
    NotFound,
}

/// Telemetry entry for one finished invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub call_id: String,
    pub tool_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: u64,
    pub terminal: TerminalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

impl ExecutionRecord {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: &ToolOutput,
        duration_ms: u64,
        terminal: TerminalState,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: output.success,
            duration_ms,
            timestamp: now_millis(),
            terminal,
            error_code: output.error_code().map(|c| c.as_str().to_string()),
            attempts: 1,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Ring buffer of [`ExecutionRecord`]s; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<ExecutionRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    /// A capacity of zero disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, record: ExecutionRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Most recent `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ToolError;

    fn record(name: &str) -> ExecutionRecord {
        ExecutionRecord::new("id", name, &ToolOutput::success("ok"), 1, TerminalState::Complete)
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut history = HistoryBuffer::new(2);
        history.push(record("a"));
        history.push(record("b"));
        history.push(record("c"));

        let names: Vec<_> = history.iter().map(|r| r.tool_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut history = HistoryBuffer::new(10);
        for name in ["a", "b", "c", "d"] {
            history.push(record(name));
        }
        let names: Vec<_> = history.recent(2).into_iter().map(|r| r.tool_name).collect();
        assert_eq!(names, vec!["c", "d"]);
        assert_eq!(history.recent(100).len(), 4);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut history = HistoryBuffer::new(0);
        history.push(record("a"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_captures_error_code() {
        let out = ToolOutput::failure(ToolError::not_found("x"));
        let rec =
            ExecutionRecord::new("id", "x", &out, 0, TerminalState::NotFound).with_attempts(0);
        assert!(!rec.success);
        assert_eq!(rec.error_code.as_deref(), Some("NOT_FOUND"));
        assert_eq!(rec.attempts, 0);
    }
}
