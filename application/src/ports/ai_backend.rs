//! AI backend port
//!
//! Defines the interface the agent loop uses to talk to a text-generation
//! model. Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Timeout")]
    Timeout,

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One generated response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    /// Provider identifier (e.g. "openai")
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl AiResponse {
    pub fn new(content: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provider: provider.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Gateway to a text-generation model.
///
/// Failures must surface as `Err`; an empty success is rejected by the agent
/// loop as [`BackendError::EmptyResponse`].
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn generate_response(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<AiResponse, BackendError>;
}
