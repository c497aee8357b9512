//! Orchestrator parameters: approval and retry policy.

use std::time::Duration;
use toolgate_domain::RetryPolicy;

/// Parameters for [`ToolOrchestrator`](crate::use_cases::orchestrator::ToolOrchestrator).
///
/// # Approval defaults
///
/// | Setting | Default | Effect |
/// |---------|---------|--------|
/// | `auto_approve_non_mutating` | `true` | `NeedsApproval` calls that do not mutate skip the handlers |
/// | `auto_approve_without_handlers` | `true` | With zero handlers registered, `NeedsApproval` calls run |
///
/// The second default makes the approval gate inert until a handler is
/// wired. Set it to `false` for deployments where that is unacceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorParams {
    /// How long to wait for all approval handlers.
    pub approval_timeout: Duration,
    pub auto_approve_non_mutating: bool,
    pub auto_approve_without_handlers: bool,
    pub retry: RetryPolicy,
    /// Deadline for a single execution attempt, on top of the tool's own timeout.
    pub global_timeout: Duration,
    /// Capacity of the execution record ring buffer.
    pub max_history: usize,
    /// Maximum concurrent runs in `run_parallel`.
    pub max_parallel: usize,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::from_secs(60),
            auto_approve_non_mutating: true,
            auto_approve_without_handlers: true,
            retry: RetryPolicy::default(),
            global_timeout: Duration::from_secs(120),
            max_history: 1000,
            max_parallel: 10,
        }
    }
}

impl OrchestratorParams {
    // ==================== Builder Methods ====================

    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    pub fn with_auto_approve_non_mutating(mut self, enabled: bool) -> Self {
        self.auto_approve_non_mutating = enabled;
        self
    }

    pub fn with_auto_approve_without_handlers(mut self, enabled: bool) -> Self {
        self.auto_approve_without_handlers = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = OrchestratorParams::default();
        assert_eq!(params.approval_timeout, Duration::from_secs(60));
        assert!(params.auto_approve_non_mutating);
        assert!(params.auto_approve_without_handlers);
        assert_eq!(params.retry.max_attempts, 3);
        assert_eq!(params.global_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_builder() {
        let params = OrchestratorParams::default()
            .with_auto_approve_without_handlers(false)
            .with_retry(RetryPolicy::none());
        assert!(!params.auto_approve_without_handlers);
        assert_eq!(params.retry.max_attempts, 1);
    }
}
