//! Browser tools: named actions forwarded to a [`BrowserDriver`]

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_application::{BrowserDriver, BrowserError, ToolHandler};
use toolgate_domain::{ContentItem, ToolError, ToolInvocation, ToolKind, ToolOutput, ToolSpec};

/// One browser action exposed as a tool.
///
/// All browser tools share a single driver, so they are never parallel-safe.
/// Actions only read page state and are treated as non-mutating.
pub struct BrowserActionHandler {
    spec: ToolSpec,
    action: String,
    driver: Arc<dyn BrowserDriver>,
}

impl BrowserActionHandler {
    pub fn new(spec: ToolSpec, action: impl Into<String>, driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            spec: spec
                .with_kind(ToolKind::Browser)
                .with_parallel_safe(false)
                .with_mutating(false),
            action: action.into(),
            driver,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

fn to_tool_error(error: BrowserError, tool: &str) -> ToolError {
    match error {
        BrowserError::Cancelled => ToolError::cancelled(tool),
        BrowserError::UnsupportedAction(_) => ToolError::validation(error.to_string()),
        BrowserError::Unavailable(_) => ToolError::transient(error.to_string()),
        BrowserError::Navigation(_) => ToolError::execution_failed(error.to_string()),
    }
}

#[async_trait]
impl ToolHandler for BrowserActionHandler {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn handle(
        &self,
        invocation: &ToolInvocation,
        cancel: CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let value = self
            .driver
            .perform(&self.action, invocation.arguments(), cancel)
            .await
            .map_err(|e| to_tool_error(e, invocation.tool_name()))?;

        // Drivers report screenshots as {"url": ..., "mime_type": ...}
        let image = value.get("url").and_then(|u| u.as_str()).map(|url| ContentItem::Image {
            url: url.to_string(),
            mime_type: value
                .get("mime_type")
                .and_then(|m| m.as_str())
                .map(str::to_string),
        });

        let mut output =
            ToolOutput::success(value.clone()).with_metadata("action", self.action.clone());
        if let Some(item) = image {
            output = output.with_item(item);
        }
        Ok(output)
    }
}
