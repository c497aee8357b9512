//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is `#[serde(default)]`, so a partial file is always valid;
//! bad values surface through [`FileConfig::validate`] instead of failing
//! the load.

mod agent;
mod logging;
mod registry;
mod tools;

pub use agent::{BACKEND_PROVIDERS, FileAgentConfig, FileBackendConfig};
pub use logging::FileLoggingConfig;
pub use registry::{FileOrchestratorConfig, FileRegistryConfig, FileRetryConfig};
pub use tools::{
    DEFAULT_SHELL_COMMANDS, FileRemoteToolConfig, FileShellConfig, FileToolParameter,
    validate_remote_tools,
};

use serde::{Deserialize, Serialize};
use toolgate_application::{AgentParams, OrchestratorParams, RegistryParams};
use toolgate_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Catalog, cache, and batch settings
    pub registry: FileRegistryConfig,
    /// Approval gate, retry, and timeout settings
    pub orchestrator: FileOrchestratorConfig,
    /// Agent loop settings
    pub agent: FileAgentConfig,
    /// Built-in shell tool
    pub shell: FileShellConfig,
    /// Diagnostic and execution logs
    pub logging: FileLoggingConfig,
    /// AI backend used by `toolgate agent`
    pub backend: FileBackendConfig,
    /// HTTP-served tools
    pub remote_tools: Vec<FileRemoteToolConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.registry.validate());
        issues.extend(self.orchestrator.validate());
        issues.extend(self.agent.validate());
        issues.extend(self.shell.validate());
        issues.extend(self.backend.validate());
        issues.extend(validate_remote_tools(&self.remote_tools));
        issues
    }

    pub fn to_registry_params(&self) -> RegistryParams {
        self.registry.to_params()
    }

    pub fn to_orchestrator_params(&self) -> OrchestratorParams {
        self.orchestrator.to_params()
    }

    pub fn to_agent_params(&self) -> AgentParams {
        self.agent.to_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[registry]
max_parallel = 4
enable_cache = false

[orchestrator]
approval_timeout_secs = 5
auto_approve_without_handlers = false

[orchestrator.retry]
max_attempts = 5
jitter = 0.0

[agent]
max_turns = 3

[shell]
read_only_commands = ["ls"]

[logging]
execution_log = "exec.jsonl"

[[remote_tools]]
name = "lookup"
endpoint = "http://localhost:9000/lookup"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.registry.max_parallel, 4);
        assert!(!config.to_registry_params().enable_cache);

        let orchestrator = config.to_orchestrator_params();
        assert_eq!(orchestrator.approval_timeout.as_secs(), 5);
        assert!(!orchestrator.auto_approve_without_handlers);
        assert_eq!(orchestrator.retry.max_attempts, 5);
        assert_eq!(orchestrator.retry.jitter, 0.0);

        assert_eq!(config.to_agent_params().max_turns, 3);
        assert_eq!(config.shell.read_only_commands, vec!["ls"]);
        assert_eq!(config.remote_tools.len(), 1);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[orchestrator.retry]
max_attempts = 1
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestrator.retry.max_attempts, 1);
        // Defaults should apply
        assert_eq!(config.orchestrator.retry.base_delay_ms, 1000);
        assert_eq!(config.registry, FileRegistryConfig::default());
        assert!(config.shell.enabled);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_collects_across_sections() {
        let mut config = FileConfig::default();
        config.registry.max_parallel = 0;
        config.agent.max_turns = 0;
        config.backend.provider = "unknown".into();
        assert_eq!(config.validate().len(), 3);
    }
}
