//! Per-tool execution metrics.

use super::entities::ToolSpec;
use crate::core::clock::now_millis;
use serde::{Deserialize, Serialize};

/// Running counters for one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolMetrics {
    pub call_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_duration_ms: u64,
    pub last_call: Option<u64>,
    pub last_error: Option<String>,
}

impl ToolMetrics {
    pub fn record_success(&mut self, duration_ms: u64) {
        self.call_count += 1;
        self.success_count += 1;
        self.total_duration_ms += duration_ms;
        self.last_call = Some(now_millis());
    }

    pub fn record_failure(&mut self, duration_ms: u64, error: impl Into<String>) {
        self.call_count += 1;
        self.failure_count += 1;
        self.total_duration_ms += duration_ms;
        self.last_call = Some(now_millis());
        self.last_error = Some(error.into());
    }

    pub fn avg_duration_ms(&self) -> f64 {
        if self.call_count == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.call_count as f64
        }
    }

    /// `None` until the tool has been called at least once
    pub fn success_rate(&self) -> Option<f64> {
        (self.call_count > 0).then(|| self.success_count as f64 / self.call_count as f64)
    }
}

/// Serializable snapshot of a tool and its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    pub name: String,
    pub kind: String,
    pub category: String,
    pub call_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub avg_duration_ms: f64,
    pub success_rate: Option<f64>,
    pub last_call: Option<u64>,
    pub last_error: Option<String>,
}

impl ToolStats {
    pub fn new(spec: &ToolSpec, metrics: &ToolMetrics) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind.as_str().to_string(),
            category: spec.category.clone(),
            call_count: metrics.call_count,
            success_count: metrics.success_count,
            failure_count: metrics.failure_count,
            avg_duration_ms: metrics.avg_duration_ms(),
            success_rate: metrics.success_rate(),
            last_call: metrics.last_call,
            last_error: metrics.last_error.clone(),
        }
    }
}
