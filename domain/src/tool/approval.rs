//! Approval gate value objects.

use super::entities::{Arguments, InvocationContext, ToolInvocation};
use crate::core::clock::now_millis;
use serde::{Deserialize, Serialize};

/// What a handler demands before an invocation may run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "requirement", rename_all = "snake_case")]
pub enum ApprovalRequirement {
    /// Run without asking
    Skip,
    /// Ask the registered approval handlers
    NeedsApproval { reason: Option<String> },
    /// Never run
    Forbidden { reason: Option<String> },
}

impl ApprovalRequirement {
    pub fn needs_approval(reason: impl Into<String>) -> Self {
        Self::NeedsApproval {
            reason: Some(reason.into()),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: Some(reason.into()),
        }
    }
}

/// Decision returned by one approval handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    /// Approve and remember for this (user, session, tool)
    ApprovedForSession,
    Denied { reason: Option<String> },
    /// Stop; treated like a denial
    Abort { reason: Option<String> },
}

impl ApprovalDecision {
    pub fn is_approving(&self) -> bool {
        matches!(self, Self::Approved | Self::ApprovedForSession)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::ApprovedForSession => "approved_for_session",
            Self::Denied { .. } => "denied",
            Self::Abort { .. } => "abort",
        }
    }
}

/// Payload broadcast to approval handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub call_id: String,
    pub tool_name: String,
    pub description: String,
    pub arguments: Arguments,
    pub reason: Option<String>,
    pub mutating: bool,
    pub context: InvocationContext,
    pub timestamp: u64,
}

impl ApprovalRequest {
    pub fn new(
        invocation: &ToolInvocation,
        description: impl Into<String>,
        reason: Option<String>,
        mutating: bool,
    ) -> Self {
        Self {
            call_id: invocation.call_id().to_string(),
            tool_name: invocation.tool_name().to_string(),
            description: description.into(),
            arguments: invocation.arguments().clone(),
            reason,
            mutating,
            context: invocation.context().clone(),
            timestamp: now_millis(),
        }
    }
}

/// Key of a session-scoped approval grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalGrantKey {
    pub user_id: String,
    pub session_id: String,
    pub tool_name: String,
}

impl ApprovalGrantKey {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            tool_name: tool_name.into(),
        }
    }

    /// Missing identifiers fall back to `unknown` user and `default` session.
    pub fn for_invocation(invocation: &ToolInvocation) -> Self {
        let context = invocation.context();
        Self::new(
            context.user_id.as_deref().unwrap_or("unknown"),
            context.session_id.as_deref().unwrap_or("default"),
            invocation.tool_name(),
        )
    }
}

impl std::fmt::Display for ApprovalGrantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.user_id, self.session_id, self.tool_name)
    }
}
