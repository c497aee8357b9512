//! Tool orchestrator: approval gate, retry with backoff, and global timeout.
//!
//! Every invocation walks the same phases (see [`InvocationPhase`]):
//!
//! ```text
//! START ──▶ APPROVAL ──▶ EXECUTE(1) ──▶ … ──▶ EXECUTE(n) ──▶ COMPLETE
//!   │          ├──▶ REJECTED
//!   │          └──▶ APPROVAL_TIMEOUT
//!   └──▶ NOT_FOUND
//! ```
//!
//! The orchestrator runs tools through [`RegisteredTool::execute`] directly,
//! so results are never served from the registry cache: a gated call
//! always reaches its handler.

use crate::config::OrchestratorParams;
use crate::ports::approval_handler::ApprovalHandler;
use crate::ports::execution_logger::{ExecutionLogger, NoExecutionLogger};
use crate::sync::{lock, read, write};
use crate::tooling::registered::panic_payload;
use crate::tooling::{BatchCall, BatchResult, RegisteredTool, SelectOptions, ToolRegistry};
use futures::FutureExt;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use toolgate_domain::{
    ApprovalDecision, ApprovalGrantKey, ApprovalRequest, ApprovalRequirement, Arguments,
    ErrorCode, ExecutionRecord, HistoryBuffer, InvocationContext, InvocationPhase, TerminalState,
    ToolError, ToolInvocation, ToolOutput,
};
use tracing::{Instrument, debug, info, info_span, warn};

/// Outcome of the approval gate
#[derive(Debug, Clone, PartialEq, Eq)]
enum GateOutcome {
    Approved,
    Rejected(String),
    TimedOut,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total: u64,
    successful: u64,
    failed: u64,
    total_duration_ms: u64,
}

/// Snapshot of orchestrator-level counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorStats {
    pub total_executions: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: Option<f64>,
    pub avg_duration_ms: f64,
    pub approval_handlers: usize,
    pub session_grants: usize,
}

/// Runs tool invocations through approval, retry, and timeout policy.
pub struct ToolOrchestrator {
    registry: Arc<ToolRegistry>,
    params: OrchestratorParams,
    approval_handlers: RwLock<Vec<Arc<dyn ApprovalHandler>>>,
    session_grants: Mutex<HashSet<ApprovalGrantKey>>,
    history: Mutex<HistoryBuffer>,
    counters: Mutex<Counters>,
    logger: Arc<dyn ExecutionLogger>,
}

impl ToolOrchestrator {
    pub fn new(registry: Arc<ToolRegistry>, params: OrchestratorParams) -> Self {
        Self {
            registry,
            history: Mutex::new(HistoryBuffer::new(params.max_history)),
            params,
            approval_handlers: RwLock::new(Vec::new()),
            session_grants: Mutex::new(HashSet::new()),
            counters: Mutex::new(Counters::default()),
            logger: Arc::new(NoExecutionLogger),
        }
    }

    /// Forward every terminal record to `logger`
    pub fn with_logger(mut self, logger: Arc<dyn ExecutionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    // ==================== Approval handlers ====================

    pub fn add_approval_handler(&self, handler: Arc<dyn ApprovalHandler>) {
        debug!(handler = handler.name(), "Added approval handler");
        write(&self.approval_handlers).push(handler);
    }

    pub fn remove_approval_handler(&self, handler: &Arc<dyn ApprovalHandler>) -> bool {
        let mut handlers = write(&self.approval_handlers);
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    pub fn approval_handler_count(&self) -> usize {
        read(&self.approval_handlers).len()
    }

    pub fn clear_session_approvals(&self) {
        lock(&self.session_grants).clear();
    }

    pub fn has_session_grant(&self, key: &ApprovalGrantKey) -> bool {
        lock(&self.session_grants).contains(key)
    }

    // ==================== Running ====================

    /// Run one tool through the full gate
    pub async fn run(
        &self,
        name: &str,
        arguments: Arguments,
        context: InvocationContext,
    ) -> ToolOutput {
        self.run_invocation(ToolInvocation::new(name, arguments, context))
            .await
    }

    /// Run a prepared invocation. Always returns an output; failures carry
    /// their code in `metadata.code`.
    pub async fn run_invocation(&self, invocation: ToolInvocation) -> ToolOutput {
        let span = info_span!(
            "tool_call",
            tool = invocation.tool_name(),
            call_id = invocation.call_id()
        );
        self.run_gated(invocation).instrument(span).await
    }

    async fn run_gated(&self, invocation: ToolInvocation) -> ToolOutput {
        let start = Instant::now();
        debug!(phase = %InvocationPhase::Start, "Invocation started");

        let Some(tool) = self.registry.get(invocation.tool_name()) else {
            let output = ToolOutput::failure(ToolError::not_found(invocation.tool_name()));
            return self.finish(&invocation, output, start, InvocationPhase::NotFound, 0);
        };

        debug!(phase = %InvocationPhase::Approval, "Checking approval");
        match self.approve(&tool, &invocation).await {
            GateOutcome::Approved => {}
            GateOutcome::Rejected(reason) => {
                let output = ToolOutput::failure(ToolError::rejected(reason));
                return self.finish(&invocation, output, start, InvocationPhase::Rejected, 0);
            }
            GateOutcome::TimedOut => {
                let ms = self.params.approval_timeout.as_millis() as u64;
                let output = ToolOutput::failure(ToolError::approval_timeout(ms));
                return self.finish(
                    &invocation,
                    output,
                    start,
                    InvocationPhase::ApprovalTimeout,
                    0,
                );
            }
        }

        let (output, attempts) = self.execute_with_retry(&tool, &invocation).await;
        self.finish(&invocation, output, start, InvocationPhase::Complete, attempts)
    }

    /// Run calls one after another, each through the full gate
    pub async fn run_batch(
        &self,
        calls: Vec<BatchCall>,
        context: &InvocationContext,
        stop_on_error: bool,
    ) -> Vec<BatchResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.run_call(call, context).await;
            let failed = !result.output.success;
            results.push(result);
            if failed && stop_on_error {
                break;
            }
        }
        results
    }

    /// Run calls concurrently (bounded by `max_parallel`), each through the
    /// full gate. Every call settles; results keep input order.
    pub async fn run_parallel(
        &self,
        calls: Vec<BatchCall>,
        context: &InvocationContext,
    ) -> Vec<BatchResult> {
        let max = self.params.max_parallel.max(1);
        stream::iter(calls.into_iter().map(|call| self.run_call(call, context)))
            .buffered(max)
            .collect()
            .await
    }

    /// Run the best-ranked tool for `query`
    pub async fn run_best_match(
        &self,
        query: &str,
        arguments: Arguments,
        context: InvocationContext,
    ) -> ToolOutput {
        let best = self
            .registry
            .select_tools(query, &SelectOptions::default().with_limit(1))
            .into_iter()
            .next();

        match best {
            Some(ranked) => {
                info!(query, tool = %ranked.spec.name, score = ranked.score, "Selected tool");
                self.run(&ranked.spec.name, arguments, context).await
            }
            None => ToolOutput::failure(ToolError::new(
                ErrorCode::NotFound,
                format!("No tool matches query: {}", query),
            )),
        }
    }

    async fn run_call(&self, call: BatchCall, context: &InvocationContext) -> BatchResult {
        let invocation = ToolInvocation::new(call.name, call.arguments, context.clone());
        let name = invocation.tool_name().to_string();
        let call_id = invocation.call_id().to_string();
        let output = self.run_invocation(invocation).await;
        BatchResult {
            name,
            call_id,
            output,
        }
    }

    // ==================== Approval gate ====================

    async fn approve(&self, tool: &RegisteredTool, invocation: &ToolInvocation) -> GateOutcome {
        let key = ApprovalGrantKey::for_invocation(invocation);
        if self.has_session_grant(&key) {
            debug!(grant = %key, "Approved by session grant");
            return GateOutcome::Approved;
        }

        let handler = tool.handler();
        let reason = match handler.approval_requirement(invocation) {
            ApprovalRequirement::Skip => return GateOutcome::Approved,
            ApprovalRequirement::Forbidden { reason } => {
                return GateOutcome::Rejected(
                    reason.unwrap_or_else(|| "Tool is forbidden".to_string()),
                );
            }
            ApprovalRequirement::NeedsApproval { reason } => reason,
        };

        let mutating = handler.is_mutating(invocation);
        if self.params.auto_approve_non_mutating && !mutating {
            debug!("Auto-approved non-mutating invocation");
            return GateOutcome::Approved;
        }

        let handlers: Vec<Arc<dyn ApprovalHandler>> = read(&self.approval_handlers).clone();
        if handlers.is_empty() {
            if self.params.auto_approve_without_handlers {
                warn!(
                    tool = invocation.tool_name(),
                    "No approval handlers registered, auto-approving"
                );
                return GateOutcome::Approved;
            }
            return GateOutcome::Rejected("No approval handlers registered".to_string());
        }

        let request = ApprovalRequest::new(
            invocation,
            tool.spec().description.clone(),
            reason,
            mutating,
        );
        let observers = self.registry.observers();
        observers.notify(|o| o.on_approval_requested(&request));

        let asks = join_all(handlers.iter().map(|h| {
            let request = &request;
            async move {
                match AssertUnwindSafe(h.request_approval(request)).catch_unwind().await {
                    Ok(Ok(decision)) => decision,
                    Ok(Err(e)) => {
                        warn!(handler = h.name(), "Approval handler failed: {}", e);
                        ApprovalDecision::Denied {
                            reason: Some(e.to_string()),
                        }
                    }
                    Err(panic) => {
                        let reason =
                            format!("Approval handler panicked: {}", panic_payload(panic.as_ref()));
                        warn!(handler = h.name(), "{}", reason);
                        ApprovalDecision::Denied {
                            reason: Some(reason),
                        }
                    }
                }
            }
        }));

        let decisions = match tokio::time::timeout(self.params.approval_timeout, asks).await {
            Ok(decisions) => decisions,
            Err(_) => {
                warn!(
                    tool = invocation.tool_name(),
                    timeout_ms = self.params.approval_timeout.as_millis() as u64,
                    "Approval timed out"
                );
                return GateOutcome::TimedOut;
            }
        };

        let decision = combine_decisions(decisions);
        observers.notify(|o| o.on_approval_decision(&request, &decision));
        debug!(decision = decision.label(), "Approval decided");

        match decision {
            ApprovalDecision::Approved => GateOutcome::Approved,
            ApprovalDecision::ApprovedForSession => {
                debug!(grant = %key, "Recording session grant");
                lock(&self.session_grants).insert(key);
                GateOutcome::Approved
            }
            ApprovalDecision::Denied { reason } | ApprovalDecision::Abort { reason } => {
                GateOutcome::Rejected(reason.unwrap_or_else(|| "User denied".to_string()))
            }
        }
    }

    // ==================== Execution ====================

    async fn execute_with_retry(
        &self,
        tool: &RegisteredTool,
        invocation: &ToolInvocation,
    ) -> (ToolOutput, u32) {
        let policy = &self.params.retry;
        let global = self.params.global_timeout;

        for attempt in 1..=policy.max_attempts {
            debug!(phase = %InvocationPhase::Execute { attempt }, "Executing");

            let output = match tokio::time::timeout(global, tool.execute(invocation)).await {
                Ok(output) => output,
                Err(_) => ToolOutput::failure(ToolError::timeout(global.as_millis() as u64)),
            };

            if output.success || !policy.should_retry(attempt, &output) {
                return (output, attempt);
            }

            let sample = rand::thread_rng().gen_range(-1.0..=1.0);
            let delay = policy.backoff_delay(attempt, sample);
            let error = output.content_text();
            warn!(
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Transient failure, retrying: {}",
                error
            );
            self.registry
                .observers()
                .notify(|o| o.on_retry(invocation, attempt, delay, &error));
            tokio::time::sleep(delay).await;
        }

        let output = ToolOutput::failure(ToolError::execution_failed(format!(
            "Failed after {} attempts",
            policy.max_attempts
        )));
        (output, 0)
    }

    fn finish(
        &self,
        invocation: &ToolInvocation,
        output: ToolOutput,
        start: Instant,
        phase: InvocationPhase,
        attempts: u32,
    ) -> ToolOutput {
        let duration_ms = start.elapsed().as_millis() as u64;
        let terminal = phase.terminal_state().unwrap_or(TerminalState::Complete);

        let output = if attempts > 0 {
            output.with_metadata("attempts", attempts)
        } else {
            output
        };

        {
            let mut counters = lock(&self.counters);
            counters.total += 1;
            counters.total_duration_ms += duration_ms;
            if output.success {
                counters.successful += 1;
            } else {
                counters.failed += 1;
            }
        }

        let record = ExecutionRecord::new(
            invocation.call_id(),
            invocation.tool_name(),
            &output,
            duration_ms,
            terminal,
        )
        .with_attempts(attempts);
        self.logger.log(&record);
        lock(&self.history).push(record);

        info!(
            phase = %phase,
            success = output.success,
            duration_ms,
            attempts,
            "Invocation finished"
        );
        output
    }

    // ==================== Telemetry ====================

    pub fn stats(&self) -> OrchestratorStats {
        let counters = *lock(&self.counters);
        OrchestratorStats {
            total_executions: counters.total,
            successful: counters.successful,
            failed: counters.failed,
            success_rate: (counters.total > 0)
                .then(|| counters.successful as f64 / counters.total as f64),
            avg_duration_ms: if counters.total > 0 {
                counters.total_duration_ms as f64 / counters.total as f64
            } else {
                0.0
            },
            approval_handlers: self.approval_handler_count(),
            session_grants: lock(&self.session_grants).len(),
        }
    }

    /// Most recent terminal records, oldest first
    pub fn history(&self, limit: usize) -> Vec<ExecutionRecord> {
        lock(&self.history).recent(limit)
    }
}

/// All handlers must approve. The first denial or abort wins; otherwise any
/// session approval upgrades the combined decision.
fn combine_decisions(decisions: Vec<ApprovalDecision>) -> ApprovalDecision {
    let mut session = false;
    for decision in decisions {
        match decision {
            ApprovalDecision::Approved => {}
            ApprovalDecision::ApprovedForSession => session = true,
            refusal => return refusal,
        }
    }
    if session {
        ApprovalDecision::ApprovedForSession
    } else {
        ApprovalDecision::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryParams;
    use crate::ports::approval_handler::{ApprovalError, AutoApproveHandler};
    use crate::ports::tool_handler::ToolHandler;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use toolgate_domain::{RetryPolicy, ToolParameter, ToolSpec};

    enum Behavior {
        Echo,
        Fail(&'static str),
        FailTimes(usize, &'static str),
        Sleep(Duration),
    }

    struct CountingTool {
        spec: ToolSpec,
        behavior: Behavior,
        calls: AtomicUsize,
        forbidden: bool,
    }

    impl CountingTool {
        fn new(spec: ToolSpec, behavior: Behavior) -> Self {
            Self {
                spec,
                behavior,
                calls: AtomicUsize::new(0),
                forbidden: false,
            }
        }

        fn forbidden(mut self) -> Self {
            self.forbidden = true;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolHandler for CountingTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        fn approval_requirement(&self, invocation: &ToolInvocation) -> ApprovalRequirement {
            if self.forbidden {
                return ApprovalRequirement::forbidden("Never allowed");
            }
            if self.spec.requires_approval {
                ApprovalRequirement::needs_approval(format!(
                    "Tool '{}' requires user approval",
                    invocation.tool_name()
                ))
            } else {
                ApprovalRequirement::Skip
            }
        }

        async fn handle(
            &self,
            invocation: &ToolInvocation,
            _cancel: CancellationToken,
        ) -> Result<ToolOutput, ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match &self.behavior {
                Behavior::Echo => Ok(ToolOutput::success(
                    invocation.get_string("message").unwrap_or_default(),
                )),
                Behavior::Fail(msg) => Err(ToolError::execution_failed(*msg)),
                Behavior::FailTimes(times, msg) => {
                    if n <= *times {
                        Err(ToolError::execution_failed(*msg))
                    } else {
                        Ok(ToolOutput::success("recovered"))
                    }
                }
                Behavior::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(ToolOutput::success("late"))
                }
            }
        }
    }

    struct CountingApprover {
        decision: ApprovalDecision,
        delay: Duration,
        fail: bool,
        panics: bool,
        calls: AtomicUsize,
    }

    impl CountingApprover {
        fn new(decision: ApprovalDecision) -> Self {
            Self {
                decision,
                delay: Duration::ZERO,
                fail: false,
                panics: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing() -> Self {
            let mut approver = Self::new(ApprovalDecision::Approved);
            approver.fail = true;
            approver
        }

        fn panicking() -> Self {
            let mut approver = Self::new(ApprovalDecision::Approved);
            approver.panics = true;
            approver
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApprovalHandler for CountingApprover {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<ApprovalDecision, ApprovalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ApprovalError::IoError("terminal closed".into()));
            }
            if self.panics {
                panic!("prompt crashed");
            }
            Ok(self.decision.clone())
        }
    }

    fn fast_retry() -> OrchestratorParams {
        OrchestratorParams::default().with_retry(
            RetryPolicy::default()
                .with_base_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5)),
        )
    }

    fn setup(tools: Vec<Arc<CountingTool>>, params: OrchestratorParams) -> ToolOrchestrator {
        let registry = Arc::new(ToolRegistry::new(RegistryParams::default()));
        for tool in tools {
            registry.register(tool).unwrap();
        }
        ToolOrchestrator::new(registry, params)
    }

    fn echo_tool() -> Arc<CountingTool> {
        Arc::new(CountingTool::new(
            ToolSpec::new("echo", "Echo a message")
                .with_parameter(ToolParameter::new("message", "Text", true)),
            Behavior::Echo,
        ))
    }

    fn danger_tool() -> Arc<CountingTool> {
        Arc::new(CountingTool::new(
            ToolSpec::new("danger", "Deletes things")
                .with_mutating(true)
                .with_requires_approval(true),
            Behavior::Echo,
        ))
    }

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn session_ctx() -> InvocationContext {
        InvocationContext::new().with_user("u1").with_session("s1")
    }

    #[tokio::test]
    async fn test_echo_scenario_needs_no_approval() {
        let tool = echo_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        let approver = Arc::new(CountingApprover::new(ApprovalDecision::Approved));
        orchestrator.add_approval_handler(approver.clone());

        let out = orchestrator
            .run("echo", args(json!({"message": "hi"})), InvocationContext::new())
            .await;

        assert!(out.success);
        assert_eq!(out.content, json!("hi"));
        assert_eq!(out.metadata["attempts"], json!(1));
        assert_eq!(approver.calls(), 0);
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn test_danger_auto_approves_without_handlers_by_default() {
        let tool = danger_tool();
        let orchestrator = setup(vec![tool.clone()], OrchestratorParams::default());
        assert!(orchestrator.params().auto_approve_without_handlers);

        let out = orchestrator
            .run("danger", Arguments::new(), InvocationContext::new())
            .await;
        assert!(out.success);
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn test_danger_rejected_without_handlers_when_disabled() {
        let tool = danger_tool();
        let orchestrator = setup(
            vec![tool.clone()],
            OrchestratorParams::default().with_auto_approve_without_handlers(false),
        );

        let out = orchestrator
            .run("danger", Arguments::new(), InvocationContext::new())
            .await;
        assert_eq!(out.error_code(), Some(ErrorCode::Rejected));
        assert_eq!(tool.calls(), 0);
        assert_eq!(orchestrator.history(1)[0].terminal, TerminalState::Rejected);
    }

    #[tokio::test]
    async fn test_retry_bound_for_transient_failures() {
        let tool = Arc::new(CountingTool::new(
            ToolSpec::new("flaky", "Flaky"),
            Behavior::Fail("Service temporarily unavailable"),
        ));
        let orchestrator = setup(vec![tool.clone()], fast_retry());

        let out = orchestrator
            .run("flaky", Arguments::new(), InvocationContext::new())
            .await;
        assert!(!out.success);
        assert_eq!(tool.calls(), 3);
        assert_eq!(out.metadata["attempts"], json!(3));
        assert_eq!(orchestrator.history(1)[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let tool = Arc::new(CountingTool::new(
            ToolSpec::new("flaky", "Flaky"),
            Behavior::FailTimes(1, "HTTP 503"),
        ));
        let orchestrator = setup(vec![tool.clone()], fast_retry());

        let out = orchestrator
            .run("flaky", Arguments::new(), InvocationContext::new())
            .await;
        assert!(out.success);
        assert_eq!(tool.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let tool = Arc::new(CountingTool::new(
            ToolSpec::new("strict", "Strict"),
            Behavior::Fail("invalid argument"),
        ));
        let orchestrator = setup(vec![tool.clone()], fast_retry());

        let out = orchestrator
            .run("strict", Arguments::new(), InvocationContext::new())
            .await;
        assert!(!out.success);
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_yields_synthetic_failure() {
        let tool = echo_tool();
        let orchestrator = setup(
            vec![tool.clone()],
            OrchestratorParams::default().with_retry(RetryPolicy::default().with_max_attempts(0)),
        );

        let out = orchestrator
            .run("echo", args(json!({"message": "hi"})), InvocationContext::new())
            .await;
        assert_eq!(out.content_text(), "Failed after 0 attempts");
        assert_eq!(tool.calls(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_tool_never_runs() {
        let tool = Arc::new(
            CountingTool::new(ToolSpec::new("nuke", "Forbidden"), Behavior::Echo).forbidden(),
        );
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        let approver = Arc::new(CountingApprover::new(ApprovalDecision::Approved));
        orchestrator.add_approval_handler(approver.clone());
        orchestrator.add_approval_handler(Arc::new(AutoApproveHandler));

        let out = orchestrator
            .run("nuke", Arguments::new(), InvocationContext::new())
            .await;
        assert_eq!(out.error_code(), Some(ErrorCode::Rejected));
        assert_eq!(out.content_text(), "Never allowed");
        assert_eq!(tool.calls(), 0);
        assert_eq!(approver.calls(), 0);
    }

    #[tokio::test]
    async fn test_session_grant_is_reused() {
        let tool = danger_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        let approver = Arc::new(CountingApprover::new(ApprovalDecision::ApprovedForSession));
        orchestrator.add_approval_handler(approver.clone());

        let first = orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        let second = orchestrator.run("danger", Arguments::new(), session_ctx()).await;

        assert!(first.success);
        assert!(second.success);
        assert_eq!(approver.calls(), 1);
        assert_eq!(tool.calls(), 2);
        assert!(orchestrator.has_session_grant(&ApprovalGrantKey::new("u1", "s1", "danger")));

        // another session asks again
        let other = InvocationContext::new().with_user("u1").with_session("s2");
        orchestrator.run("danger", Arguments::new(), other).await;
        assert_eq!(approver.calls(), 2);

        orchestrator.clear_session_approvals();
        orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        assert_eq!(approver.calls(), 3);
    }

    #[tokio::test]
    async fn test_unanimity_required() {
        let tool = danger_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        orchestrator.add_approval_handler(Arc::new(AutoApproveHandler));
        orchestrator.add_approval_handler(Arc::new(CountingApprover::new(
            ApprovalDecision::Denied {
                reason: Some("not today".into()),
            },
        )));

        let out = orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        assert_eq!(out.error_code(), Some(ErrorCode::Rejected));
        assert_eq!(out.content_text(), "not today");
        assert_eq!(tool.calls(), 0);
    }

    #[tokio::test]
    async fn test_handler_error_counts_as_denial() {
        let tool = danger_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        orchestrator.add_approval_handler(Arc::new(CountingApprover::failing()));

        let out = orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        assert_eq!(out.error_code(), Some(ErrorCode::Rejected));
        assert_eq!(tool.calls(), 0);
    }

    #[tokio::test]
    async fn test_handler_panic_counts_as_denial() {
        let tool = danger_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        let approver = Arc::new(CountingApprover::panicking());
        orchestrator.add_approval_handler(approver.clone());

        let out = orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        assert_eq!(out.error_code(), Some(ErrorCode::Rejected));
        assert_eq!(out.content_text(), "Approval handler panicked: prompt crashed");
        assert_eq!(approver.calls(), 1);
        assert_eq!(tool.calls(), 0);
        assert_eq!(orchestrator.history(1)[0].terminal, TerminalState::Rejected);
    }

    #[tokio::test]
    async fn test_approval_timeout() {
        let tool = danger_tool();
        let orchestrator = setup(
            vec![tool.clone()],
            fast_retry().with_approval_timeout(Duration::from_millis(50)),
        );
        orchestrator.add_approval_handler(Arc::new(
            CountingApprover::new(ApprovalDecision::Approved).slow(Duration::from_secs(5)),
        ));

        let start = Instant::now();
        let out = orchestrator.run("danger", Arguments::new(), session_ctx()).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(out.error_code(), Some(ErrorCode::ApprovalTimeout));
        assert_eq!(out.content_text(), "Approval timed out after 50ms");
        assert_eq!(tool.calls(), 0);
        assert_eq!(
            orchestrator.history(1)[0].terminal,
            TerminalState::ApprovalTimeout
        );
    }

    #[tokio::test]
    async fn test_non_mutating_auto_approve_toggle() {
        let tool = Arc::new(CountingTool::new(
            ToolSpec::new("peek", "Read only").with_requires_approval(true),
            Behavior::Echo,
        ));
        let approver = Arc::new(CountingApprover::new(ApprovalDecision::Approved));

        let lenient = setup(vec![tool.clone()], fast_retry());
        lenient.add_approval_handler(approver.clone());
        lenient.run("peek", Arguments::new(), session_ctx()).await;
        assert_eq!(approver.calls(), 0);

        let strict = setup(
            vec![tool.clone()],
            fast_retry().with_auto_approve_non_mutating(false),
        );
        strict.add_approval_handler(approver.clone());
        strict.run("peek", Arguments::new(), session_ctx()).await;
        assert_eq!(approver.calls(), 1);
    }

    #[tokio::test]
    async fn test_global_timeout() {
        let tool = Arc::new(CountingTool::new(
            ToolSpec::new("slow", "Slow").with_timeout(Duration::from_secs(30)),
            Behavior::Sleep(Duration::from_secs(5)),
        ));
        let orchestrator = setup(
            vec![tool.clone()],
            OrchestratorParams::default()
                .with_global_timeout(Duration::from_millis(50))
                .with_retry(RetryPolicy::none()),
        );

        let start = Instant::now();
        let out = orchestrator
            .run("slow", Arguments::new(), InvocationContext::new())
            .await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(out.error_code(), Some(ErrorCode::Timeout));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let orchestrator = setup(vec![], fast_retry());
        let out = orchestrator
            .run("ghost", Arguments::new(), InvocationContext::new())
            .await;
        assert_eq!(out.error_code(), Some(ErrorCode::NotFound));
        assert_eq!(orchestrator.history(1)[0].terminal, TerminalState::NotFound);
    }

    #[tokio::test]
    async fn test_orchestrator_bypasses_registry_cache() {
        let tool = echo_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());
        for _ in 0..2 {
            orchestrator
                .run("echo", args(json!({"message": "hi"})), InvocationContext::new())
                .await;
        }
        assert_eq!(tool.calls(), 2);
    }

    #[tokio::test]
    async fn test_batch_helpers() {
        let ok = echo_tool();
        let bad = Arc::new(CountingTool::new(
            ToolSpec::new("bad", "Bad"),
            Behavior::Fail("invalid argument"),
        ));
        let orchestrator = setup(vec![ok.clone(), bad.clone()], fast_retry());
        let calls = || {
            vec![
                BatchCall::new("bad", Arguments::new()),
                BatchCall::new("echo", args(json!({"message": "x"}))),
            ]
        };

        let stopped = orchestrator
            .run_batch(calls(), &InvocationContext::new(), true)
            .await;
        assert_eq!(stopped.len(), 1);

        let parallel = orchestrator
            .run_parallel(calls(), &InvocationContext::new())
            .await;
        assert_eq!(parallel.len(), 2);
        assert!(!parallel[0].output.success);
        assert!(parallel[1].output.success);
    }

    #[tokio::test]
    async fn test_run_best_match() {
        let tool = echo_tool();
        let orchestrator = setup(vec![tool.clone()], fast_retry());

        // before any call, so success-rate bonuses don't lift unrelated tools
        let none = orchestrator
            .run_best_match("zzz", Arguments::new(), InvocationContext::new())
            .await;
        assert_eq!(none.error_code(), Some(ErrorCode::NotFound));
        assert_eq!(tool.calls(), 0);

        let out = orchestrator
            .run_best_match("echo this", args(json!({"message": "yo"})), InvocationContext::new())
            .await;
        assert_eq!(out.content, json!("yo"));
    }

    #[tokio::test]
    async fn test_stats_and_handler_management() {
        let orchestrator = setup(vec![echo_tool()], fast_retry());
        let handler: Arc<dyn ApprovalHandler> = Arc::new(AutoApproveHandler);
        orchestrator.add_approval_handler(handler.clone());
        assert_eq!(orchestrator.approval_handler_count(), 1);

        orchestrator
            .run("echo", args(json!({"message": "a"})), InvocationContext::new())
            .await;
        orchestrator
            .run("ghost", Arguments::new(), InvocationContext::new())
            .await;

        let stats = orchestrator.stats();
        assert_eq!(stats.total_executions, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.success_rate, Some(0.5));
        assert_eq!(stats.approval_handlers, 1);

        assert!(orchestrator.remove_approval_handler(&handler));
        assert!(!orchestrator.remove_approval_handler(&handler));
    }

    #[test]
    fn test_combine_decisions() {
        use ApprovalDecision::*;
        assert_eq!(combine_decisions(vec![Approved, Approved]), Approved);
        assert_eq!(
            combine_decisions(vec![Approved, ApprovedForSession]),
            ApprovedForSession
        );
        assert_eq!(
            combine_decisions(vec![ApprovedForSession, Abort { reason: None }]),
            Abort { reason: None }
        );
    }
}
