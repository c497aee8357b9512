//! A handler plus the runtime guarantees wrapped around it.

use super::observers::ObserverSet;
use crate::ports::tool_handler::ToolHandler;
use crate::sync::lock;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{ToolError, ToolInvocation, ToolMetrics, ToolOutput, ToolSpec, ToolStats};
use tracing::{debug, warn};

/// Registry entry: the handler, its metrics, and the shared observers.
///
/// [`execute`](Self::execute) is the only path by which handlers run. It
/// validates, enforces the tool's timeout, converts handler errors and
/// panics into failed outputs, records metrics, and notifies observers. It
/// always returns a [`ToolOutput`].
pub struct RegisteredTool {
    handler: Arc<dyn ToolHandler>,
    metrics: Mutex<ToolMetrics>,
    observers: Arc<ObserverSet>,
    shutdown: CancellationToken,
}

impl RegisteredTool {
    pub(crate) fn new(
        handler: Arc<dyn ToolHandler>,
        observers: Arc<ObserverSet>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            handler,
            metrics: Mutex::new(ToolMetrics::default()),
            observers,
            shutdown,
        }
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }

    pub fn spec(&self) -> &ToolSpec {
        self.handler.spec()
    }

    pub fn metrics(&self) -> ToolMetrics {
        lock(&self.metrics).clone()
    }

    pub fn stats(&self) -> ToolStats {
        ToolStats::new(self.spec(), &self.metrics())
    }

    pub async fn execute(&self, invocation: &ToolInvocation) -> ToolOutput {
        let start = Instant::now();

        let report = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.validate(invocation)
        })) {
            Ok(report) => report,
            Err(panic) => {
                let message =
                    format!("Tool validation panicked: {}", panic_payload(panic.as_ref()));
                warn!(tool = invocation.tool_name(), "{}", message);
                let output = ToolOutput::failure(ToolError::internal(message));
                self.finish(invocation, &output, start);
                return output;
            }
        };
        if !report.valid {
            let output = ToolOutput::failure(ToolError::validation(report.summary()))
                .with_metadata("validation_errors", report.errors.clone());
            self.finish(invocation, &output, start);
            return output;
        }

        if self.shutdown.is_cancelled() {
            let output = ToolOutput::failure(ToolError::cancelled(invocation.tool_name()));
            self.finish(invocation, &output, start);
            return output;
        }

        self.observers.notify(|o| o.on_start(invocation));
        debug!(
            tool = invocation.tool_name(),
            call_id = invocation.call_id(),
            "Executing tool"
        );

        // Cancelled when this future completes or is dropped by an outer timeout
        let cancel = self.shutdown.child_token();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let timeout = self.spec().timeout;
        let call = AssertUnwindSafe(self.handler.handle(invocation, cancel.clone())).catch_unwind();

        let output = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(Ok(output))) => output,
            Ok(Ok(Err(error))) => ToolOutput::failure(error),
            Ok(Err(panic)) => {
                let message = format!("Tool panicked: {}", panic_payload(panic.as_ref()));
                warn!(tool = invocation.tool_name(), "{}", message);
                ToolOutput::failure(ToolError::internal(message))
            }
            Err(_) => {
                cancel.cancel();
                ToolOutput::failure(ToolError::timeout(timeout.as_millis() as u64))
            }
        };

        self.finish(invocation, &output, start);
        output
    }

    fn finish(&self, invocation: &ToolInvocation, output: &ToolOutput, start: Instant) {
        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        if output.success {
            lock(&self.metrics).record_success(duration_ms);
            self.observers
                .notify(|o| o.on_complete(invocation, output, elapsed));
        } else {
            let message = output.content_text();
            lock(&self.metrics).record_failure(duration_ms, message.clone());
            debug!(
                tool = invocation.tool_name(),
                call_id = invocation.call_id(),
                code = output.error_code().map(|c| c.as_str()),
                "Tool execution failed: {}",
                message
            );
            self.observers
                .notify(|o| o.on_error(invocation, &message, elapsed));
        }
    }
}

/// Text carried by a panic payload
pub(crate) fn panic_payload(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string payload"
    }
}
