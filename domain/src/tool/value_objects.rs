//! Tool domain value objects: immutable output and error types
//!
//! Every invocation ends in a [`ToolOutput`]. Handlers report failures as a
//! typed [`ToolError`]; the runtime normalizes those (and its own timeouts,
//! rejections, and lookups) into a failed output whose `metadata.code`
//! carries the [`ErrorCode`].
//!
//! | Code | Retried | Raised by |
//! |------|---------|-----------|
//! | `VALIDATION_ERROR` | No | Argument validation |
//! | `NOT_FOUND` | No | Registry lookup |
//! | `REJECTED` | No | Approval gate |
//! | `APPROVAL_TIMEOUT` | No | Approval gate |
//! | `TIMEOUT` | Yes | Execution deadline |
//! | `TRANSIENT` | Yes | Handlers reporting a retryable condition |
//! | `EXECUTION_FAILED` | By message | Handlers |
//! | `CANCELLED` | No | Cancellation token |
//! | `INTERNAL_ERROR` | No | Panics caught at the handler boundary |

use crate::core::clock::now_millis;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Machine-readable failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Rejected,
    ApprovalTimeout,
    Timeout,
    Transient,
    ExecutionFailed,
    Cancelled,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Rejected => "REJECTED",
            ErrorCode::ApprovalTimeout => "APPROVAL_TIMEOUT",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Transient => "TRANSIENT",
            ErrorCode::ExecutionFailed => "EXECUTION_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "VALIDATION_ERROR" => Some(ErrorCode::ValidationError),
            "NOT_FOUND" => Some(ErrorCode::NotFound),
            "REJECTED" => Some(ErrorCode::Rejected),
            "APPROVAL_TIMEOUT" => Some(ErrorCode::ApprovalTimeout),
            "TIMEOUT" => Some(ErrorCode::Timeout),
            "TRANSIENT" => Some(ErrorCode::Transient),
            "EXECUTION_FAILED" => Some(ErrorCode::ExecutionFailed),
            "CANCELLED" => Some(ErrorCode::Cancelled),
            "INTERNAL_ERROR" => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error reported by a tool handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ToolError {
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional structured details, merged into the output metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(tool_name: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Tool not found: {}", tool_name))
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::Rejected, reason)
    }

    pub fn approval_timeout(timeout_ms: u64) -> Self {
        Self::new(
            ErrorCode::ApprovalTimeout,
            format!("Approval timed out after {}ms", timeout_ms),
        )
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Tool execution timed out after {}ms", timeout_ms),
        )
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transient, message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, message)
    }

    pub fn cancelled(tool_name: &str) -> Self {
        Self::new(ErrorCode::Cancelled, format!("Tool execution cancelled: {}", tool_name))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<String> for ToolError {
    fn from(message: String) -> Self {
        Self::execution_failed(message)
    }
}

impl From<&str> for ToolError {
    fn from(message: &str) -> Self {
        Self::execution_failed(message)
    }
}

/// Structured piece of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
    Image { url: String, mime_type: Option<String> },
    Json { value: Value },
}

/// Terminal result of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Success payload, or a human-readable error string on failure
    pub content: Value,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_items: Vec<ContentItem>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub timestamp: u64,
}

impl ToolOutput {
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            success: true,
            content_items: Vec::new(),
            metadata: Map::new(),
            timestamp: now_millis(),
        }
    }

    pub fn failure(error: ToolError) -> Self {
        let mut metadata = error.details;
        metadata.insert("code".to_string(), Value::String(error.code.as_str().to_string()));
        Self {
            content: Value::String(error.message),
            success: false,
            content_items: Vec::new(),
            metadata,
            timestamp: now_millis(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.content_items.push(item);
        self
    }

    /// Failure code, if this is a failed output
    pub fn error_code(&self) -> Option<ErrorCode> {
        if self.success {
            return None;
        }
        self.metadata
            .get("code")
            .and_then(|v| v.as_str())
            .and_then(ErrorCode::parse)
    }

    /// Content rendered as plain text (strings unquoted, everything else as JSON)
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Error message for failed outputs
    pub fn error_message(&self) -> Option<String> {
        (!self.success).then(|| self.content_text())
    }
}

impl From<Value> for ToolOutput {
    fn from(content: Value) -> Self {
        Self::success(content)
    }
}

impl From<String> for ToolOutput {
    fn from(content: String) -> Self {
        Self::success(content)
    }
}

impl From<&str> for ToolOutput {
    fn from(content: &str) -> Self {
        Self::success(content)
    }
}

impl From<ToolError> for ToolOutput {
    fn from(error: ToolError) -> Self {
        Self::failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_carries_code_and_message() {
        let output = ToolOutput::failure(ToolError::timeout(250));
        assert!(!output.success);
        assert_eq!(output.content, json!("Tool execution timed out after 250ms"));
        assert_eq!(output.metadata["code"], "TIMEOUT");
        assert_eq!(output.error_code(), Some(ErrorCode::Timeout));
    }

    #[test]
    fn test_failure_merges_details() {
        let error = ToolError::execution_failed("exit 2").with_detail("exit_code", 2);
        let output = ToolOutput::failure(error);
        assert_eq!(output.metadata["exit_code"], 2);
        assert_eq!(output.metadata["code"], "EXECUTION_FAILED");
    }

    #[test]
    fn test_success_has_no_error_code() {
        let output = ToolOutput::success("hi").with_metadata("code", "TIMEOUT");
        assert_eq!(output.error_code(), None);
        assert_eq!(output.content_text(), "hi");
        assert_eq!(output.error_message(), None);
    }

    #[test]
    fn test_content_text_of_structured_payload() {
        let output = ToolOutput::success(json!({"a": 1}));
        assert_eq!(output.content_text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_error_code_round_trip_strings() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::Rejected,
            ErrorCode::ApprovalTimeout,
            ErrorCode::Timeout,
            ErrorCode::Transient,
            ErrorCode::ExecutionFailed,
            ErrorCode::Cancelled,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::parse("NOPE"), None);
    }

    #[test]
    fn test_tool_error_display() {
        let error = ToolError::not_found("weather");
        assert_eq!(error.to_string(), "[NOT_FOUND] Tool not found: weather");
    }

    #[test]
    fn test_content_item_serialization() {
        let item = ContentItem::Text { text: "x".into() };
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"type": "text", "text": "x"}));
    }
}
