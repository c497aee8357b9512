//! Agent and backend configuration from TOML (`[agent]`, `[backend]` sections)

use serde::{Deserialize, Serialize};
use toolgate_application::AgentParams;
use toolgate_domain::{ConfigIssue, ConfigIssueCode};

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// max_turns = 10
/// max_tokens = 2048
/// system_prompt = "You are a careful operator."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub max_turns: usize,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_tokens: Some(2048),
            system_prompt: None,
        }
    }
}

impl FileAgentConfig {
    pub fn to_params(&self) -> AgentParams {
        let params = AgentParams::default()
            .with_max_turns(self.max_turns)
            .with_max_tokens(self.max_tokens);
        match &self.system_prompt {
            Some(prompt) => params.with_system_prompt(prompt.clone()),
            None => params,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.max_turns == 0 {
            vec![ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "agent.max_turns".to_string(),
                },
                "agent.max_turns: 0 means the agent can never answer",
            )]
        } else {
            vec![]
        }
    }
}

/// Supported backend providers
pub const BACKEND_PROVIDERS: &[&str] = &["openai"];

/// Raw AI backend configuration
///
/// Any OpenAI-compatible chat completions endpoint works.
///
/// ```toml
/// [backend]
/// provider = "openai"
/// base_url = "https://api.openai.com/v1"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// timeout_secs = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl FileBackendConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let provider = self.provider.to_lowercase();
        if !BACKEND_PROVIDERS.contains(&provider.as_str()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: "backend.provider".to_string(),
                    value: self.provider.clone(),
                    valid_values: BACKEND_PROVIDERS.iter().map(|s| s.to_string()).collect(),
                },
                format!(
                    "backend.provider: unknown value '{}', falling back to 'openai'",
                    self.provider
                ),
            ));
        }
        if self.model.trim().is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingValue {
                    field: "backend.model".to_string(),
                },
                "backend.model is empty",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_defaults() {
        assert_eq!(FileAgentConfig::default().to_params(), AgentParams::default());
    }

    #[test]
    fn test_system_prompt_is_carried() {
        let config = FileAgentConfig {
            system_prompt: Some("Be brief.".into()),
            ..Default::default()
        };
        assert_eq!(config.to_params().system_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_unknown_provider_warns() {
        let config = FileBackendConfig {
            provider: "carrier-pigeon".into(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::InvalidEnumValue { .. }
        ));
    }
}
