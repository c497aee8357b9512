//! Approval handler port for gating risky tool invocations.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ApprovalHandler`] - defined here in application layer
//! - **Adapter**: `InteractiveApprovalHandler` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! ToolOrchestrator::run()
//!        ↓
//! approval_requirement() == NeedsApproval
//!        ↓
//! every ApprovalHandler::request_approval()   (concurrently, raced against approval_timeout)
//!        ↓
//! all approving? ── no ──▶ REJECTED
//!        ↓ yes
//! any ApprovedForSession? ── yes ──▶ write session grant
//!        ↓
//! execute
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveHandler`] - Always returns `ApprovalDecision::Approved`
//! - [`AutoDenyHandler`] - Always returns `ApprovalDecision::Denied`

use async_trait::async_trait;
use toolgate_domain::{ApprovalDecision, ApprovalRequest};

/// Error raised while collecting a decision.
///
/// These errors represent failures of the approval channel, not decisions.
/// The orchestrator treats any of them as a denial.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApprovalError {
    /// User cancelled the prompt (e.g., via Ctrl+C).
    #[error("Approval cancelled")]
    Cancelled,
    /// Input/output error (e.g., terminal read failure).
    #[error("I/O error: {0}")]
    IoError(String),
    /// Invalid user input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Port for approving or denying a tool invocation.
///
/// Every registered handler receives every request; the call proceeds only
/// when all of them approve.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str {
        "approval-handler"
    }

    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ApprovalError>;
}

/// Approves everything.
///
/// # Warning
///
/// **Use with caution!** This turns the approval gate into a pass-through.
/// Only use for headless runs in a sandbox, or in tests.
pub struct AutoApproveHandler;

#[async_trait]
impl ApprovalHandler for AutoApproveHandler {
    fn name(&self) -> &str {
        "auto-approve"
    }

    async fn request_approval(
        &self,
        _request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision::Approved)
    }
}

/// Denies everything. The safest non-interactive mode.
pub struct AutoDenyHandler;

#[async_trait]
impl ApprovalHandler for AutoDenyHandler {
    fn name(&self) -> &str {
        "auto-deny"
    }

    async fn request_approval(
        &self,
        _request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision::Denied {
            reason: Some("Denied by policy".to_string()),
        })
    }
}
