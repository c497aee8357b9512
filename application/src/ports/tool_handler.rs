//! Tool handler port: the capability interface every tool implements.
//!
//! Infrastructure provides the concrete variants (function, shell, browser,
//! remote). The runtime only ever talks to `dyn ToolHandler`.
//!
//! | Method | Provided | Purpose |
//! |--------|----------|---------|
//! | [`spec`](ToolHandler::spec) | no | Static description and flags |
//! | [`validate`](ToolHandler::validate) | yes | Required params and primitive types |
//! | [`is_mutating`](ToolHandler::is_mutating) | yes | Per-invocation side-effect classification |
//! | [`approval_requirement`](ToolHandler::approval_requirement) | yes | Skip / needs approval / forbidden |
//! | [`handle`](ToolHandler::handle) | no | The core action |
//!
//! Handlers never deal with timeouts, metrics, or observers: the registry's
//! `RegisteredTool` wraps every handler with those.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{
    ApprovalRequirement, ToolError, ToolInvocation, ToolOutput, ToolSpec, ValidationReport,
    validate_arguments,
};

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    fn name(&self) -> &str {
        &self.spec().name
    }

    fn validate(&self, invocation: &ToolInvocation) -> ValidationReport {
        validate_arguments(self.spec(), invocation.arguments())
    }

    fn is_mutating(&self, _invocation: &ToolInvocation) -> bool {
        self.spec().mutating
    }

    fn approval_requirement(&self, _invocation: &ToolInvocation) -> ApprovalRequirement {
        if self.spec().requires_approval {
            ApprovalRequirement::needs_approval(format!(
                "Tool '{}' requires user approval",
                self.spec().name
            ))
        } else {
            ApprovalRequirement::Skip
        }
    }

    /// Run the tool.
    ///
    /// `cancel` fires when the runtime abandons the call (timeout or
    /// shutdown). Long-running handlers should select on it and stop.
    async fn handle(
        &self,
        invocation: &ToolInvocation,
        cancel: CancellationToken,
    ) -> Result<ToolOutput, ToolError>;
}
