//! Port for structured execution logging.
//!
//! Defines the [`ExecutionLogger`] trait for recording every terminal
//! invocation outcome ([`ExecutionRecord`]) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable audit trail (JSONL) that outlives the in-memory history.

use toolgate_domain::ExecutionRecord;

/// Port for logging execution records.
///
/// The `log` method is intentionally synchronous and non-fallible to avoid
/// disrupting the invocation flow; logging failures are silently ignored.
pub trait ExecutionLogger: Send + Sync {
    fn log(&self, record: &ExecutionRecord);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoExecutionLogger;

impl ExecutionLogger for NoExecutionLogger {
    fn log(&self, _record: &ExecutionRecord) {}
}
