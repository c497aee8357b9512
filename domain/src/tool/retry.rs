//! Retry policy: failure classification and backoff math.
//!
//! Only transient failures are retried. Classification looks at the output's
//! error code first and falls back to matching the message against a fixed
//! list of patterns:
//!
//! | Class | Codes | Message patterns |
//! |-------|-------|------------------|
//! | Transient | `TIMEOUT`, `TRANSIENT` | timeout, network, connection refused, DNS, rate limit, 429/502/503, overloaded, temporarily unavailable |
//! | Permanent | `VALIDATION_ERROR`, `NOT_FOUND`, `REJECTED`, `APPROVAL_TIMEOUT`, `CANCELLED`, `INTERNAL_ERROR` | everything else |

use super::value_objects::{ErrorCode, ToolOutput};
use std::time::Duration;

/// Lowercase substrings that mark an error message as transient
pub const TRANSIENT_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "econnrefused",
    "connection refused",
    "connection reset",
    "enotfound",
    "dns",
    "rate limit",
    "too many requests",
    "429",
    "502",
    "503",
    "overloaded",
    "temporarily unavailable",
];

/// Whether a failure may succeed on retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Whether an error message matches the transient taxonomy
pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Classify a failed output. Successful outputs are never retried.
pub fn classify_failure(output: &ToolOutput) -> FailureClass {
    if output.success {
        return FailureClass::Permanent;
    }

    match output.error_code() {
        Some(ErrorCode::Timeout | ErrorCode::Transient) => FailureClass::Transient,
        Some(
            ErrorCode::ValidationError
            | ErrorCode::NotFound
            | ErrorCode::Rejected
            | ErrorCode::ApprovalTimeout
            | ErrorCode::Cancelled
            | ErrorCode::InternalError,
        ) => FailureClass::Permanent,
        Some(ErrorCode::ExecutionFailed) | None => {
            if is_transient_message(&output.content_text()) {
                FailureClass::Transient
            } else {
                FailureClass::Permanent
            }
        }
    }
}

/// Bounded exponential backoff with symmetric jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    /// Cap applied before jitter
    pub max_delay: Duration,
    /// Jitter amplitude as a fraction of the capped delay (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// No retries: a single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    ///
    /// `jitter_sample` must lie in `[-1.0, 1.0]`; callers draw it uniformly.
    /// The result is `min(base * multiplier^(attempt-1), cap) + capped * jitter * sample`,
    /// clamped at zero.
    pub fn backoff_delay(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let sample = jitter_sample.clamp(-1.0, 1.0);
        let jittered = capped + capped * self.jitter * sample;

        if jittered.is_finite() && jittered > 0.0 {
            Duration::from_secs_f64(jittered)
        } else {
            Duration::ZERO
        }
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn should_retry(&self, attempt: u32, output: &ToolOutput) -> bool {
        attempt < self.max_attempts && classify_failure(output) == FailureClass::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ToolError;

    fn failed(error: ToolError) -> ToolOutput {
        ToolOutput::failure(error)
    }

    #[test]
    fn test_transient_messages() {
        for msg in [
            "connect ECONNREFUSED 127.0.0.1:80",
            "getaddrinfo ENOTFOUND api.example.com",
            "Rate limit exceeded",
            "HTTP 429",
            "upstream returned 503",
            "Model is overloaded",
            "Service temporarily unavailable",
            "network unreachable",
        ] {
            assert!(is_transient_message(msg), "{msg} should be transient");
        }
        assert!(!is_transient_message("invalid argument"));
        assert!(!is_transient_message("permission denied"));
    }

    #[test]
    fn test_classify_by_code_before_message() {
        // A validation message mentioning "timeout" stays permanent
        let validation = failed(ToolError::validation(
            "Parameter 'timeout' should be number, got string",
        ));
        assert_eq!(classify_failure(&validation), FailureClass::Permanent);

        assert_eq!(classify_failure(&failed(ToolError::timeout(50))), FailureClass::Transient);
        assert_eq!(
            classify_failure(&failed(ToolError::transient("flaky"))),
            FailureClass::Transient
        );
        assert_eq!(
            classify_failure(&failed(ToolError::execution_failed("HTTP 502"))),
            FailureClass::Transient
        );
        assert_eq!(
            classify_failure(&failed(ToolError::execution_failed("invalid argument"))),
            FailureClass::Permanent
        );
    }

    #[test]
    fn test_success_is_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1, &ToolOutput::success("ok")));
    }

    #[test]
    fn test_should_retry_respects_bound() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        let out = failed(ToolError::execution_failed("network error"));
        assert!(policy.should_retry(1, &out));
        assert!(policy.should_retry(2, &out));
        assert!(!policy.should_retry(3, &out));
    }

    #[test]
    fn test_backoff_without_jitter() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1, 0.0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2, 0.0), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(3, 0.0), Duration::from_millis(4000));
        // capped
        assert_eq!(policy.backoff_delay(10, 0.0), Duration::from_millis(10_000));
    }

    #[test]
    fn test_backoff_jitter_is_symmetric_around_capped_value() {
        let policy = RetryPolicy::default();
        let high = policy.backoff_delay(10, 1.0);
        let low = policy.backoff_delay(10, -1.0);
        assert_eq!(high, Duration::from_millis(11_000));
        assert_eq!(low, Duration::from_millis(9_000));
    }

    #[test]
    fn test_backoff_clamps_at_zero() {
        let policy = RetryPolicy::default().with_jitter(2.0);
        assert_eq!(policy.backoff_delay(1, -1.0), Duration::ZERO);
    }
}
