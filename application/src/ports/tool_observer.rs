//! Tool lifecycle observer port.
//!
//! [`ToolObserver`] is an **output port**: telemetry sinks and UIs subscribe
//! to invocation lifecycle events by registering an observer on the
//! `ToolRegistry`. The orchestrator forwards approval and retry events to
//! the same observers.
//!
//! All methods have default no-op implementations, so implementers only
//! need to override the callbacks they care about. Callbacks are invoked
//! synchronously on the calling task and must not block.
//!
//! # Example Implementation
//!
//! ```ignore
//! struct CountingObserver(AtomicUsize);
//!
//! impl ToolObserver for CountingObserver {
//!     fn on_complete(&self, _inv: &ToolInvocation, _out: &ToolOutput, _elapsed: Duration) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::time::Duration;
use toolgate_domain::{ApprovalDecision, ApprovalRequest, ToolInvocation, ToolOutput};

pub trait ToolObserver: Send + Sync {
    /// Called before the handler runs (after validation passed)
    fn on_start(&self, _invocation: &ToolInvocation) {}

    /// Called when the handler produced a successful output
    fn on_complete(&self, _invocation: &ToolInvocation, _output: &ToolOutput, _elapsed: Duration) {}

    /// Called for every failed execution (validation, timeout, handler error, panic)
    fn on_error(&self, _invocation: &ToolInvocation, _error: &str, _elapsed: Duration) {}

    /// Called when the registry answered from its result cache
    fn on_cache_hit(&self, _invocation: &ToolInvocation) {}

    /// Called when approval handlers are about to be asked
    fn on_approval_requested(&self, _request: &ApprovalRequest) {}

    /// Called with the combined decision of all approval handlers
    fn on_approval_decision(&self, _request: &ApprovalRequest, _decision: &ApprovalDecision) {}

    /// Called before sleeping ahead of another attempt
    fn on_retry(
        &self,
        _invocation: &ToolInvocation,
        _attempt: u32,
        _delay: Duration,
        _error: &str,
    ) {
    }
}

/// No-op observer
pub struct NoToolObserver;

impl ToolObserver for NoToolObserver {}
