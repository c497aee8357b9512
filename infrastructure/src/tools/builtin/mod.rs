//! Built-in tools: `echo`, `get_time`, `calculate`, and (with the
//! `http-tools` feature) `http_request`
//!
//! All of them are [`FunctionHandler`]s: parallel-safe, non-mutating, and
//! free of approval requirements.

mod calculator;
#[cfg(feature = "http-tools")]
mod http;

pub use calculator::{CalcError, evaluate};
#[cfg(feature = "http-tools")]
pub use http::{HTTP_REQUEST, http_request_tool};

use super::function::FunctionHandler;
use serde_json::Value;
use std::sync::Arc;
use toolgate_application::ToolHandler;
use toolgate_domain::{ToolError, ToolParameter, ToolSpec};

pub const ECHO: &str = "echo";
pub const GET_TIME: &str = "get_time";
pub const CALCULATE: &str = "calculate";

/// Category shared by the built-in tools
pub const BUILTIN_CATEGORY: &str = "utility";

pub fn echo_tool() -> FunctionHandler {
    let spec = ToolSpec::new(ECHO, "Echo back the given message")
        .with_category(BUILTIN_CATEGORY)
        .with_parameter(ToolParameter::new("message", "Text to echo", true));

    FunctionHandler::new(spec, |args, _| async move {
        Ok::<_, ToolError>(args.get("message").cloned().unwrap_or(Value::Null))
    })
}

pub fn get_time_tool() -> FunctionHandler {
    let spec = ToolSpec::new(GET_TIME, "Get the current date and time in UTC (RFC 3339)")
        .with_category(BUILTIN_CATEGORY);

    FunctionHandler::new(spec, |_, _| async {
        Ok::<_, ToolError>(
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        )
    })
}

pub fn calculate_tool() -> FunctionHandler {
    let spec = ToolSpec::new(
        CALCULATE,
        "Evaluate an arithmetic expression with + - * / % ^ and parentheses",
    )
    .with_category(BUILTIN_CATEGORY)
    .with_parameter(ToolParameter::new(
        "expression",
        "Expression to evaluate, e.g. (2 + 3) * 4",
        true,
    ));

    FunctionHandler::new(spec, |args, _| async move {
        let expression = args
            .get("expression")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let value = evaluate(expression).map_err(|e| {
            if e.is_syntax() {
                ToolError::validation(e.to_string())
            } else {
                ToolError::execution_failed(e.to_string())
            }
        })?;
        Ok::<_, ToolError>(number_value(value))
    })
}

/// Integral results are reported as JSON integers
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Every built-in tool available in this build
pub fn builtin_tools() -> Vec<Arc<dyn ToolHandler>> {
    #[allow(unused_mut)]
    let mut tools: Vec<Arc<dyn ToolHandler>> = vec![
        Arc::new(echo_tool()),
        Arc::new(get_time_tool()),
        Arc::new(calculate_tool()),
    ];
    #[cfg(feature = "http-tools")]
    tools.push(Arc::new(http_request_tool(reqwest::Client::new())));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use toolgate_domain::{ErrorCode, InvocationContext, ToolInvocation, ToolOutput};

    async fn call(handler: &FunctionHandler, args: Value) -> Result<ToolOutput, ToolError> {
        let inv = ToolInvocation::new(
            handler.name(),
            args.as_object().cloned().unwrap(),
            InvocationContext::new(),
        );
        handler.handle(&inv, CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_echo() {
        let output = call(&echo_tool(), json!({"message": "hi"})).await.unwrap();
        assert_eq!(output.content, json!("hi"));
    }

    #[tokio::test]
    async fn test_get_time_is_rfc3339_utc() {
        let output = call(&get_time_tool(), json!({})).await.unwrap();
        let text = output.content_text();
        assert!(text.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&text).is_ok());
    }

    #[tokio::test]
    async fn test_calculate() {
        let tool = calculate_tool();
        let output = call(&tool, json!({"expression": "(2 + 3) * 4"})).await.unwrap();
        assert_eq!(output.content, json!(20));

        let output = call(&tool, json!({"expression": "7 / 2"})).await.unwrap();
        assert_eq!(output.content, json!(3.5));

        let err = call(&tool, json!({"expression": "1 / 0"})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecutionFailed);
        assert_eq!(err.message, "Division by zero");

        let err = call(&tool, json!({"expression": "2 +"})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_builtin_tools_are_safe() {
        let tools = builtin_tools();
        assert!(tools.len() >= 3);
        for tool in &tools {
            let spec = tool.spec();
            assert!(spec.parallel_safe, "{} should be parallel-safe", spec.name);
            assert!(!spec.mutating);
            assert!(!spec.requires_approval);
            assert_eq!(spec.category, BUILTIN_CATEGORY);
        }
    }
}
