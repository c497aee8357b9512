//! Agent parameters: loop control for
//! [`RunAgentUseCase`](crate::use_cases::run_agent::RunAgentUseCase).

/// Agent loop control parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentParams {
    /// Maximum backend round-trips before giving up.
    pub max_turns: usize,
    /// Token limit passed to the backend.
    pub max_tokens: Option<u32>,
    /// Replaces the default base system prompt.
    pub system_prompt: Option<String>,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_tokens: Some(2048),
            system_prompt: None,
        }
    }
}

impl AgentParams {
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = AgentParams::default();
        assert_eq!(params.max_turns, 10);
        assert_eq!(params.max_tokens, Some(2048));
        assert!(params.system_prompt.is_none());
    }
}
