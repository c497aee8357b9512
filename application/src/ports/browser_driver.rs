//! Browser driver port
//!
//! Browser automation internals (page lifecycle, screenshots, DOM access) are
//! an external collaborator. Browser-kind tools reach them through this port.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolgate_domain::Arguments;

/// Errors raised by a browser driver
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrowserError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Browser unavailable: {0}")]
    Unavailable(String),

    #[error("Browser action cancelled")]
    Cancelled,
}

/// A driver able to perform named actions (e.g. `screenshot`, `navigate`)
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn perform(
        &self,
        action: &str,
        arguments: &Arguments,
        cancel: CancellationToken,
    ) -> Result<Value, BrowserError>;
}
