//! In-process tools backed by an async closure.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_application::ToolHandler;
use toolgate_domain::{Arguments, ToolError, ToolInvocation, ToolKind, ToolOutput, ToolSpec};

type BoxedFunction = Arc<
    dyn Fn(Arguments, ToolInvocation) -> BoxFuture<'static, Result<ToolOutput, ToolError>>
        + Send
        + Sync,
>;

/// A tool whose action is an async closure over `(arguments, invocation)`.
///
/// ```ignore
/// let echo = FunctionHandler::new(spec, |args, _inv| async move {
///     Ok::<_, ToolError>(args.get("message").cloned().unwrap_or_default())
/// });
/// ```
pub struct FunctionHandler {
    spec: ToolSpec,
    func: BoxedFunction,
}

impl FunctionHandler {
    /// Wrap `func`. The spec's kind is forced to [`ToolKind::Function`].
    pub fn new<F, Fut, O>(spec: ToolSpec, func: F) -> Self
    where
        F: Fn(Arguments, ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ToolError>> + Send + 'static,
        O: Into<ToolOutput>,
    {
        let func: BoxedFunction = Arc::new(move |args, invocation| {
            let fut = func(args, invocation);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Self {
            spec: spec.with_kind(ToolKind::Function),
            func,
        }
    }
}

#[async_trait]
impl ToolHandler for FunctionHandler {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn handle(
        &self,
        invocation: &ToolInvocation,
        cancel: CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let fut = (self.func)(invocation.arguments().clone(), invocation.clone());
        tokio::select! {
            result = fut => result,
            _ = cancel.cancelled() => Err(ToolError::cancelled(invocation.tool_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use toolgate_domain::{ErrorCode, InvocationContext, ToolParameter};

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(
            "greet",
            args.as_object().cloned().unwrap(),
            InvocationContext::new().with_user("u1"),
        )
    }

    fn greet() -> FunctionHandler {
        let spec = ToolSpec::new("greet", "Greet someone")
            .with_kind(ToolKind::Shell)
            .with_parameter(ToolParameter::new("name", "Who to greet", true));
        FunctionHandler::new(spec, |args, inv| async move {
            let name = args
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::validation("name must be a string"))?;
            Ok(format!(
                "hello {} from {}",
                name,
                inv.context().user_id.as_deref().unwrap_or("?")
            ))
        })
    }

    #[tokio::test]
    async fn test_closure_receives_arguments_and_context() {
        let handler = greet();
        assert_eq!(handler.spec().kind, ToolKind::Function);

        let output = handler
            .handle(&invocation(json!({"name": "ada"})), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.content, json!("hello ada from u1"));
    }

    #[tokio::test]
    async fn test_closure_error_is_returned() {
        let err = greet()
            .handle(&invocation(json!({"name": 3})), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_closure() {
        let handler = FunctionHandler::new(ToolSpec::new("slow", "Slow"), |_, _| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok::<_, ToolError>("late")
        });
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = handler
            .handle(&invocation(json!({})), cancel)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Cancelled);
    }
}
