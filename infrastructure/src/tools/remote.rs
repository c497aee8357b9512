//! Remote tools: invocations proxied to an HTTP endpoint
//!
//! Request body:
//!
//! ```json
//! {"tool": "lookup", "call_id": "...", "arguments": {...}, "context": {...}}
//! ```
//!
//! The endpoint answers `{"success": bool?, "content": ..., "metadata": {...}?}`.
//! A missing `success` means success; a non-JSON body becomes text content.

use crate::config::FileRemoteToolConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolgate_application::ToolHandler;
use toolgate_domain::{
    ParamType, ToolError, ToolInvocation, ToolKind, ToolOutput, ToolParameter, ToolSpec,
};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
}

pub struct RemoteToolHandler {
    spec: ToolSpec,
    endpoint: String,
    headers: BTreeMap<String, String>,
    client: reqwest::Client,
}

impl RemoteToolHandler {
    pub fn new(spec: ToolSpec, endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            spec: spec.with_kind(ToolKind::External),
            endpoint: endpoint.into(),
            headers: BTreeMap::new(),
            client,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Build from a `[[remote_tools]]` entry
    pub fn from_config(config: &FileRemoteToolConfig, client: reqwest::Client) -> Self {
        let mut spec = ToolSpec::new(&config.name, &config.description)
            .with_mutating(config.mutating)
            .with_requires_approval(config.requires_approval);
        if let Some(category) = &config.category {
            spec = spec.with_category(category);
        }
        if let Some(secs) = config.timeout_secs {
            spec = spec.with_timeout(Duration::from_secs(secs));
        }
        for param in &config.parameters {
            let param_type = parse_param_type(&param.param_type).unwrap_or_else(|| {
                warn!(
                    tool = %config.name,
                    "Unknown parameter type '{}' for '{}', using string",
                    param.param_type,
                    param.name
                );
                ParamType::String
            });
            spec = spec.with_parameter(
                ToolParameter::new(&param.name, &param.description, param.required)
                    .with_type(param_type),
            );
        }

        config
            .headers
            .iter()
            .fold(Self::new(spec, &config.endpoint, client), |h, (name, value)| {
                h.with_header(name, value)
            })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn parse_param_type(name: &str) -> Option<ParamType> {
    serde_json::from_value(Value::String(name.to_ascii_lowercase())).ok()
}

/// Classify a transport failure
pub(crate) fn request_error(error: reqwest::Error) -> ToolError {
    let message = format!("Request failed: {}", error);
    if error.is_timeout() || error.is_connect() {
        ToolError::transient(message)
    } else {
        ToolError::execution_failed(message)
    }
}

fn map_response(status: u16, body: &str) -> Result<ToolOutput, ToolError> {
    if !(200..300).contains(&status) {
        return Err(ToolError::execution_failed(format!("HTTP {}", status))
            .with_detail("status", status)
            .with_detail("body", toolgate_domain::truncate(body, 1024)));
    }

    let Ok(response) = serde_json::from_str::<RemoteResponse>(body) else {
        return Ok(ToolOutput::success(body.to_string()));
    };

    if response.success == Some(false) {
        let message = match &response.content {
            Value::String(s) => s.clone(),
            Value::Null => "Remote tool reported failure".to_string(),
            other => other.to_string(),
        };
        let mut error = ToolError::execution_failed(message);
        error.details = response.metadata;
        return Err(error);
    }

    let mut output = ToolOutput::success(response.content);
    for (key, value) in response.metadata {
        output = output.with_metadata(key, value);
    }
    Ok(output)
}

#[async_trait]
impl ToolHandler for RemoteToolHandler {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn handle(
        &self,
        invocation: &ToolInvocation,
        cancel: CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let body = serde_json::json!({
            "tool": invocation.tool_name(),
            "call_id": invocation.call_id(),
            "arguments": invocation.arguments(),
            "context": invocation.context(),
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        debug!(endpoint = %self.endpoint, call_id = invocation.call_id(), "Calling remote tool");

        let exchange = async {
            let response = request.send().await.map_err(request_error)?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(request_error)?;
            Ok::<_, ToolError>((status, text))
        };

        let (status, text) = tokio::select! {
            result = exchange => result?,
            _ = cancel.cancelled() => return Err(ToolError::cancelled(invocation.tool_name())),
        };

        map_response(status, &text)
    }
}
