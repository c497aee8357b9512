//! `http_request`: GET a URL

use super::BUILTIN_CATEGORY;
use crate::tools::function::FunctionHandler;
use crate::tools::remote::request_error;
use serde_json::Value;
use toolgate_domain::{ParamType, ToolError, ToolOutput, ToolParameter, ToolSpec, truncate};

pub const HTTP_REQUEST: &str = "http_request";

/// Maximum response body kept in the result (50 KB)
const MAX_BODY_TEXT: usize = 50 * 1024;

const USER_AGENT: &str = concat!("toolgate/", env!("CARGO_PKG_VERSION"));

pub fn http_request_tool(client: reqwest::Client) -> FunctionHandler {
    let spec = ToolSpec::new(HTTP_REQUEST, "Fetch a URL with an HTTP GET request")
        .with_category(BUILTIN_CATEGORY)
        .with_parameter(ToolParameter::new("url", "The URL to fetch", true))
        .with_parameter(
            ToolParameter::new("headers", "Extra request headers", false)
                .with_type(ParamType::Object),
        );

    FunctionHandler::new(spec, move |args, _| {
        let client = client.clone();
        async move {
            let url = args
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::validation("Missing required parameter: url"))?;

            let mut request = client.get(url).header("User-Agent", USER_AGENT);
            if let Some(Value::Object(headers)) = args.get("headers") {
                for (name, value) in headers {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    request = request.header(name.as_str(), value);
                }
            }

            let response = request.send().await.map_err(request_error)?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.map_err(request_error)?;

            if !status.is_success() {
                return Err(ToolError::execution_failed(format!("HTTP {}", status.as_u16()))
                    .with_detail("status", status.as_u16()));
            }

            let mut output = ToolOutput::success(truncate(&body, MAX_BODY_TEXT))
                .with_metadata("status", status.as_u16());
            if let Some(content_type) = content_type {
                output = output.with_metadata("content_type", content_type);
            }
            Ok(output)
        }
    })
}
