//! Registry and orchestrator configuration from TOML
//! (`[registry]`, `[orchestrator]`, `[orchestrator.retry]` sections)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolgate_application::{OrchestratorParams, RegistryParams};
use toolgate_domain::{ConfigIssue, ConfigIssueCode, RetryPolicy};

/// Raw registry configuration
///
/// # Example
///
/// ```toml
/// [registry]
/// max_history = 1000
/// enable_cache = true
/// cache_ttl_secs = 60
/// max_parallel = 10
/// allow_overwrite = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    pub max_history: usize,
    pub enable_cache: bool,
    pub cache_ttl_secs: u64,
    pub max_parallel: usize,
    pub allow_overwrite: bool,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            max_history: 1000,
            enable_cache: true,
            cache_ttl_secs: 60,
            max_parallel: 10,
            allow_overwrite: false,
        }
    }
}

impl FileRegistryConfig {
    pub fn to_params(&self) -> RegistryParams {
        RegistryParams::default()
            .with_max_history(self.max_history)
            .with_cache(self.enable_cache)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
            .with_max_parallel(self.max_parallel.max(1))
            .with_allow_overwrite(self.allow_overwrite)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_parallel == 0 {
            issues.push(out_of_range(
                "registry.max_parallel",
                "registry.max_parallel: 0 is not allowed, using 1",
            ));
        }
        issues
    }
}

/// Raw retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: f64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 10_000,
            jitter: 0.1,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_multiplier(self.multiplier)
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_jitter(self.jitter.clamp(0.0, 1.0))
    }
}

/// Raw orchestrator configuration
///
/// # Example
///
/// ```toml
/// [orchestrator]
/// approval_timeout_secs = 60
/// auto_approve_non_mutating = true
/// auto_approve_without_handlers = true
/// global_timeout_secs = 120
///
/// [orchestrator.retry]
/// max_attempts = 3
/// base_delay_ms = 1000
/// multiplier = 2.0
/// max_delay_ms = 10000
/// jitter = 0.1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub approval_timeout_secs: u64,
    pub auto_approve_non_mutating: bool,
    pub auto_approve_without_handlers: bool,
    pub global_timeout_secs: u64,
    pub max_history: usize,
    pub max_parallel: usize,
    pub retry: FileRetryConfig,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            approval_timeout_secs: 60,
            auto_approve_non_mutating: true,
            auto_approve_without_handlers: true,
            global_timeout_secs: 120,
            max_history: 1000,
            max_parallel: 10,
            retry: FileRetryConfig::default(),
        }
    }
}

impl FileOrchestratorConfig {
    pub fn to_params(&self) -> OrchestratorParams {
        OrchestratorParams::default()
            .with_approval_timeout(Duration::from_secs(self.approval_timeout_secs))
            .with_auto_approve_non_mutating(self.auto_approve_non_mutating)
            .with_auto_approve_without_handlers(self.auto_approve_without_handlers)
            .with_global_timeout(Duration::from_secs(self.global_timeout_secs))
            .with_max_history(self.max_history)
            .with_max_parallel(self.max_parallel.max(1))
            .with_retry(self.retry.to_policy())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_parallel == 0 {
            issues.push(out_of_range(
                "orchestrator.max_parallel",
                "orchestrator.max_parallel: 0 is not allowed, using 1",
            ));
        }
        if self.approval_timeout_secs == 0 {
            issues.push(out_of_range(
                "orchestrator.approval_timeout_secs",
                "orchestrator.approval_timeout_secs: 0 rejects every approval request",
            ));
        }
        if self.global_timeout_secs == 0 {
            issues.push(out_of_range(
                "orchestrator.global_timeout_secs",
                "orchestrator.global_timeout_secs: 0 times out every invocation",
            ));
        }
        if self.retry.max_attempts == 0 {
            issues.push(out_of_range(
                "orchestrator.retry.max_attempts",
                "orchestrator.retry.max_attempts: 0 means no tool ever runs",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            issues.push(out_of_range(
                "orchestrator.retry.jitter",
                format!(
                    "orchestrator.retry.jitter: {} is outside [0, 1], clamping",
                    self.retry.jitter
                ),
            ));
        }
        if self.retry.multiplier < 1.0 {
            issues.push(out_of_range(
                "orchestrator.retry.multiplier",
                format!(
                    "orchestrator.retry.multiplier: {} shrinks the delay between attempts",
                    self.retry.multiplier
                ),
            ));
        }
        issues
    }
}

fn out_of_range(field: &str, message: impl Into<String>) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
        },
        message,
    )
}
