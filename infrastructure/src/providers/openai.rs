//! OpenAI-compatible chat completions backend
//!
//! Works with any server exposing `POST {base_url}/chat/completions`.

use crate::config::FileBackendConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolgate_application::{AiBackend, AiResponse, BackendError, TokenUsage};
use toolgate_domain::truncate;
use tracing::{debug, warn};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Build from `[backend]`, reading the key from `api_key_env`.
    ///
    /// A missing key is not an error: local OpenAI-compatible servers often
    /// need none.
    pub fn from_config(config: &FileBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::NotConfigured(e.to_string()))?;

        let mut backend = Self::new(&config.base_url, &config.model).with_client(client);
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => backend = backend.with_api_key(key),
            _ => warn!(
                "{} is not set, calling {} without an API key",
                config.api_key_env, config.base_url
            ),
        }
        Ok(backend)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn send_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else if error.is_connect() {
        BackendError::ConnectionError(error.to_string())
    } else {
        BackendError::RequestFailed(error.to_string())
    }
}

fn parse_response(body: &str) -> Result<AiResponse, BackendError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| BackendError::InvalidResponse("response has no message content".into()))?;

    let mut response = AiResponse::new(content, PROVIDER);
    if let Some(usage) = parsed.usage {
        response = response.with_usage(TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        });
    }
    Ok(response)
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    async fn generate_response(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<AiResponse, BackendError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(model = %self.model, "Sending chat completion request");
        let response = builder.send().await.map_err(send_error)?;
        let status = response.status();
        let body = response.text().await.map_err(send_error)?;

        if !status.is_success() {
            return Err(BackendError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(body.trim(), 500)
            )));
        }

        parse_response(&body)
    }
}
