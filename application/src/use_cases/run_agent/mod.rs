//! Run Agent use case
//!
//! A bounded ask → act → observe loop over an [`AiBackend`]:
//!
//! | Step | What happens |
//! |------|--------------|
//! | 1. Prompt | System prompt lists every exported tool schema |
//! | 2. Generate | Backend answers the user message (turn 1) or the tool results |
//! | 3. Extract | ```` ```tool ```` fenced blocks become candidate calls |
//! | 4. Screen | Unknown names, non-object arguments, and duplicates are dropped |
//! | 5. Dispatch | Accepted calls run in order through the [`ToolOrchestrator`] |
//! | 6. Finish | A turn with no accepted call is the final answer |
//!
//! Running out of turns is an error value, never a panic.

mod types;

pub use types::{RunAgentError, RunAgentInput, RunAgentOutput};

use crate::config::AgentParams;
use crate::ports::agent_progress::{AgentProgressNotifier, NoAgentProgress};
use crate::ports::ai_backend::{AiBackend, AiResponse, BackendError};
use crate::use_cases::orchestrator::ToolOrchestrator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{
    AgentPromptTemplate, AgentTurn, ToolCallResult, extract_tool_calls, screen_tool_calls,
    truncate,
};
use tracing::{debug, info, warn};

/// Use case for running the tool-using agent loop
pub struct RunAgentUseCase<B: AiBackend + 'static> {
    backend: Arc<B>,
    orchestrator: Arc<ToolOrchestrator>,
    params: AgentParams,
    progress: Arc<dyn AgentProgressNotifier>,
    cancellation_token: Option<CancellationToken>,
}

impl<B: AiBackend + 'static> Clone for RunAgentUseCase<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            orchestrator: self.orchestrator.clone(),
            params: self.params.clone(),
            progress: self.progress.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<B: AiBackend + 'static> RunAgentUseCase<B> {
    pub fn new(backend: Arc<B>, orchestrator: Arc<ToolOrchestrator>, params: AgentParams) -> Self {
        Self {
            backend,
            orchestrator,
            params,
            progress: Arc::new(NoAgentProgress),
            cancellation_token: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn AgentProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    fn ensure_not_cancelled(&self) -> Result<(), RunAgentError> {
        match &self.cancellation_token {
            Some(token) if token.is_cancelled() => Err(RunAgentError::Cancelled),
            _ => Ok(()),
        }
    }

    pub async fn execute(&self, input: RunAgentInput) -> Result<RunAgentOutput, RunAgentError> {
        let registry = self.orchestrator.registry();
        let schemas = registry.export_schemas();
        let system_prompt =
            AgentPromptTemplate::system_prompt(self.params.system_prompt.as_deref(), &schemas);
        let max_turns = self.params.max_turns;

        info!(max_turns, tools = schemas.len(), "Starting agent loop");

        let mut message = input.message.clone();
        let mut tool_results: Vec<ToolCallResult> = Vec::new();
        let mut transcript: Vec<AgentTurn> = Vec::new();

        for turn in 1..=max_turns {
            self.ensure_not_cancelled()?;
            self.progress.on_turn_start(turn, max_turns);

            let response = self.generate(&system_prompt, &message).await?;
            debug!(turn, "Model response: {}", truncate(&response.content, 200));
            self.progress.on_model_response(turn, &response.content);

            let extraction = extract_tool_calls(&response.content);
            for reason in &extraction.malformed {
                warn!(turn, "Skipping malformed tool block: {}", reason);
                self.progress.on_malformed_block(reason);
            }

            let (accepted, rejected) =
                screen_tool_calls(extraction.calls, |name| registry.has_tool(name));
            for r in &rejected {
                warn!(turn, tool = %r.name, reason = %r.reason, "Rejected tool call");
                self.progress.on_tool_rejected(r);
            }
            let rejected: Vec<String> = rejected
                .iter()
                .map(|r| format!("{}: {}", r.name, r.reason))
                .collect();

            if accepted.is_empty() {
                info!(turns = turn, "Agent produced final answer");
                self.progress.on_final_answer(turn, &response.content);
                transcript.push(AgentTurn {
                    turn,
                    response: response.content.clone(),
                    calls: Vec::new(),
                    rejected,
                });
                return Ok(RunAgentOutput {
                    response: response.content,
                    turns: turn,
                    tool_results,
                    transcript,
                    provider: response.provider,
                });
            }

            debug!(turn, calls = accepted.len(), "Dispatching tool calls");
            let mut results = Vec::with_capacity(accepted.len());
            for call in accepted {
                self.ensure_not_cancelled()?;
                let output = self
                    .orchestrator
                    .run(&call.name, call.arguments.clone(), input.context.clone())
                    .await;
                let result = ToolCallResult {
                    name: call.name,
                    arguments: call.arguments,
                    output,
                };
                self.progress.on_tool_result(&result);
                results.push(result);
            }

            message = AgentPromptTemplate::tool_results(&results);
            tool_results.extend(results.iter().cloned());
            transcript.push(AgentTurn {
                turn,
                response: response.content,
                calls: results,
                rejected,
            });
        }

        warn!(max_turns, "Agent ran out of turns");
        Err(RunAgentError::MaxTurnsExceeded(max_turns))
    }

    /// Ask the backend, racing the cancellation token when one is set
    async fn generate(&self, system: &str, message: &str) -> Result<AiResponse, RunAgentError> {
        let request = self
            .backend
            .generate_response(system, message, self.params.max_tokens);

        let response = match &self.cancellation_token {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return Err(RunAgentError::Cancelled),
                response = request => response?,
            },
            None => request.await?,
        };

        if response.content.trim().is_empty() {
            return Err(BackendError::EmptyResponse.into());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OrchestratorParams, RegistryParams};
    use crate::ports::tool_handler::ToolHandler;
    use crate::tooling::ToolRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use toolgate_domain::{
        ToolError, ToolInvocation, ToolOutput, ToolParameter, ToolSpec,
    };

    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: BackendError) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Err(error)])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn user_prompts(&self) -> Vec<String> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .map(|(_, user)| user.clone())
                .collect()
        }

        fn system_prompt(&self) -> String {
            self.prompts.lock().unwrap()[0].0.clone()
        }
    }

    #[async_trait]
    impl AiBackend for ScriptedBackend {
        async fn generate_response(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            _max_tokens: Option<u32>,
        ) -> Result<AiResponse, BackendError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AGAIN_CALL.to_string()));
            reply.map(|text| AiResponse::new(text, "scripted"))
        }
    }

    struct Echo {
        spec: ToolSpec,
        calls: AtomicUsize,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                spec: ToolSpec::new("echo", "Echo a message back")
                    .with_parameter(ToolParameter::new("message", "Text to echo", true)),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ToolHandler for Echo {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn handle(
            &self,
            invocation: &ToolInvocation,
            _cancel: CancellationToken,
        ) -> Result<ToolOutput, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::success(
                invocation.get_string("message").unwrap_or_default(),
            ))
        }
    }

    fn build_agent(
        backend: Arc<ScriptedBackend>,
        params: AgentParams,
    ) -> (RunAgentUseCase<ScriptedBackend>, Arc<Echo>) {
        let registry = Arc::new(ToolRegistry::new(RegistryParams::default()));
        let echo = Arc::new(Echo::new());
        registry.register(echo.clone()).unwrap();
        let orchestrator = Arc::new(ToolOrchestrator::new(registry, OrchestratorParams::default()));
        (RunAgentUseCase::new(backend, orchestrator, params), echo)
    }

    const ECHO_CALL: &str =
        "Sure.\n```tool\n{\"name\": \"echo\", \"arguments\": {\"message\": \"hi\"}}\n```";
    const AGAIN_CALL: &str =
        "```tool\n{\"name\": \"echo\", \"arguments\": {\"message\": \"again\"}}\n```";

    #[tokio::test]
    async fn test_plain_answer_ends_loop() {
        let backend = Arc::new(ScriptedBackend::new(vec!["Hello there."]));
        let (agent, echo) = build_agent(backend.clone(), AgentParams::default());

        let out = agent.execute(RunAgentInput::new("hi")).await.unwrap();
        assert_eq!(out.response, "Hello there.");
        assert_eq!(out.turns, 1);
        assert_eq!(out.provider, "scripted");
        assert!(out.tool_results.is_empty());
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
        assert!(backend.system_prompt().contains("echo"));
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let backend = Arc::new(ScriptedBackend::new(vec![ECHO_CALL, "The tool said hi."]));
        let (agent, echo) = build_agent(backend.clone(), AgentParams::default());

        let out = agent.execute(RunAgentInput::new("say hi")).await.unwrap();
        assert_eq!(out.turns, 2);
        assert_eq!(out.response, "The tool said hi.");
        assert_eq!(out.tool_results.len(), 1);
        assert_eq!(out.tool_results[0].output.content, json!("hi"));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.transcript.len(), 2);

        let prompts = backend.user_prompts();
        assert_eq!(prompts[0], "say hi");
        assert!(prompts[1].starts_with("Tool execution results:"));
        assert!(prompts[1].contains("## echo"));
        assert!(prompts[1].contains("Status: Success"));
    }

    #[tokio::test]
    async fn test_max_turns_exceeded() {
        // the script runs dry and keeps asking for tools
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let (agent, echo) = build_agent(backend, AgentParams::default().with_max_turns(3));

        let err = agent.execute(RunAgentInput::new("loop")).await.unwrap_err();
        assert!(matches!(err, RunAgentError::MaxTurnsExceeded(3)));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_calls_are_not_dispatched() {
        let reply = "```tool\n{\"name\": \"rm_rf\", \"arguments\": {}}\n```\n\
                     ```tool\n{\"name\": \"echo\", \"arguments\": \"hi\"}\n```";
        let backend = Arc::new(ScriptedBackend::new(vec![reply]));
        let (agent, echo) = build_agent(backend, AgentParams::default());

        let out = agent.execute(RunAgentInput::new("x")).await.unwrap();
        assert_eq!(out.turns, 1);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
        assert_eq!(out.transcript[0].rejected.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_calls_run_once() {
        let reply = format!("{}\n{}", ECHO_CALL, ECHO_CALL);
        let backend = Arc::new(ScriptedBackend::new(vec![reply.as_str(), "done"]));
        let (agent, echo) = build_agent(backend, AgentParams::default());

        let out = agent.execute(RunAgentInput::new("x")).await.unwrap();
        assert_eq!(out.tool_results.len(), 1);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_json_outside_fence_is_not_a_call() {
        let reply = r#"{"name": "echo", "arguments": {"message": "hi"}}"#;
        let backend = Arc::new(ScriptedBackend::new(vec![reply]));
        let (agent, echo) = build_agent(backend, AgentParams::default());

        let out = agent.execute(RunAgentInput::new("x")).await.unwrap();
        assert_eq!(out.turns, 1);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_errors_surface() {
        let backend = Arc::new(ScriptedBackend::failing(BackendError::Timeout));
        let (agent, _) = build_agent(backend, AgentParams::default());
        let err = agent.execute(RunAgentInput::new("x")).await.unwrap_err();
        assert!(matches!(err, RunAgentError::Backend(BackendError::Timeout)));

        let blank = Arc::new(ScriptedBackend::new(vec!["   "]));
        let (agent, _) = build_agent(blank, AgentParams::default());
        let err = agent.execute(RunAgentInput::new("x")).await.unwrap_err();
        assert!(matches!(err, RunAgentError::Backend(BackendError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let backend = Arc::new(ScriptedBackend::new(vec!["never"]));
        let token = CancellationToken::new();
        token.cancel();
        let (agent, _) = build_agent(backend.clone(), AgentParams::default());
        let agent = agent.with_cancellation(token);

        let err = agent.execute(RunAgentInput::new("x")).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(backend.user_prompts().is_empty());
    }
}
