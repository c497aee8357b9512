//! Tool registry: catalog, discovery, cached dispatch, and batch execution.

use super::cache::{ResultCache, cache_key};
use super::observers::ObserverSet;
use super::registered::RegisteredTool;
use crate::config::RegistryParams;
use crate::ports::tool_handler::ToolHandler;
use crate::ports::tool_observer::ToolObserver;
use crate::sync::{lock, read, write};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use toolgate_domain::tool::ranking::DEFAULT_SELECT_LIMIT;
use toolgate_domain::{
    Arguments, ExecutionRecord, HistoryBuffer, InvocationContext, RankingQuery, TerminalState,
    ToolError, ToolInvocation, ToolMetrics, ToolOutput, ToolSpec, ToolStats, rank_tools,
};
use tracing::{debug, info, warn};

/// Errors raised while managing the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid tool spec: {0}")]
    InvalidSpec(String),
}

/// One call in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCall {
    pub name: String,
    pub arguments: Arguments,
}

impl BatchCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of one call in a batch, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub name: String,
    pub call_id: String,
    pub output: ToolOutput,
}

/// Discovery options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOptions {
    pub limit: usize,
    /// Category that earns the category bonus; defaults to query keywords
    pub category: Option<String>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SELECT_LIMIT,
            category: None,
        }
    }
}

impl SelectOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A discovery hit
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTool {
    pub spec: ToolSpec,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
struct Telemetry {
    total_calls: u64,
    successes: u64,
    failures: u64,
    cache_hits: u64,
    cache_misses: u64,
}

/// Snapshot of registry-wide counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub total_calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: usize,
    pub history_size: usize,
    pub tools: Vec<ToolStats>,
}

/// Catalog of tool handlers, owning the result cache and dispatch history.
///
/// Tools keep their registration order; discovery ties and schema export
/// follow it.
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, Arc<RegisteredTool>>>,
    cache: Mutex<ResultCache>,
    history: Mutex<HistoryBuffer>,
    telemetry: Mutex<Telemetry>,
    observers: Arc<ObserverSet>,
    shutdown: CancellationToken,
    params: RegistryParams,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(RegistryParams::default())
    }
}

impl ToolRegistry {
    pub fn new(params: RegistryParams) -> Self {
        Self {
            tools: RwLock::new(IndexMap::new()),
            cache: Mutex::new(ResultCache::new(params.cache_ttl)),
            history: Mutex::new(HistoryBuffer::new(params.max_history)),
            telemetry: Mutex::new(Telemetry::default()),
            observers: Arc::new(ObserverSet::new()),
            shutdown: CancellationToken::new(),
            params,
        }
    }

    pub fn params(&self) -> &RegistryParams {
        &self.params
    }

    // ==================== Catalog ====================

    /// Add a handler under its spec name.
    ///
    /// A name collision fails with [`RegistryError::AlreadyRegistered`]
    /// unless `allow_overwrite` is set, in which case the entry is replaced
    /// in place (keeping its position) and a warning is logged.
    pub fn register(&self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = handler.spec().name.clone();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidSpec("tool name is empty".to_string()));
        }

        let entry = Arc::new(RegisteredTool::new(
            handler,
            self.observers.clone(),
            self.shutdown.clone(),
        ));

        let mut tools = write(&self.tools);
        if tools.contains_key(&name) {
            if !self.params.allow_overwrite {
                return Err(RegistryError::AlreadyRegistered(name));
            }
            warn!(tool = %name, "Overwriting existing tool registration");
        } else {
            debug!(tool = %name, "Registered tool");
        }
        tools.insert(name, entry);
        Ok(())
    }

    /// Register several handlers, stopping at the first error
    pub fn register_all(
        &self,
        handlers: impl IntoIterator<Item = Arc<dyn ToolHandler>>,
    ) -> Result<(), RegistryError> {
        for handler in handlers {
            self.register(handler)?;
        }
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        let removed = write(&self.tools).shift_remove(name).is_some();
        if removed {
            debug!(tool = name, "Unregistered tool");
        }
        removed
    }

    /// The exact handler instance registered under `name`
    pub fn get_handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        read(&self.tools).get(name).map(|t| t.handler().clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredTool>> {
        read(&self.tools).get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        read(&self.tools).contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        read(&self.tools).keys().cloned().collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        read(&self.tools).values().map(|t| t.spec().clone()).collect()
    }

    pub fn len(&self) -> usize {
        read(&self.tools).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ==================== Observers ====================

    pub fn subscribe(&self, observer: Arc<dyn ToolObserver>) {
        self.observers.subscribe(observer);
    }

    pub fn unsubscribe(&self, observer: &Arc<dyn ToolObserver>) -> bool {
        self.observers.unsubscribe(observer)
    }

    pub fn observers(&self) -> &Arc<ObserverSet> {
        &self.observers
    }

    // ==================== Dispatch ====================

    /// Run one invocation through the cache and the tool's guarded execute.
    pub async fn dispatch(&self, invocation: ToolInvocation) -> ToolOutput {
        let start = Instant::now();
        lock(&self.telemetry).total_calls += 1;

        let Some(tool) = self.get(invocation.tool_name()) else {
            let output = ToolOutput::failure(ToolError::not_found(invocation.tool_name()));
            lock(&self.telemetry).failures += 1;
            self.record(&invocation, &output, start, TerminalState::NotFound);
            return output;
        };

        let key = (self.params.enable_cache && !tool.handler().is_mutating(&invocation))
            .then(|| cache_key(invocation.tool_name(), invocation.arguments()));

        if let Some(key) = &key {
            let cached = lock(&self.cache).get(key);
            if let Some(output) = cached {
                {
                    let mut telemetry = lock(&self.telemetry);
                    telemetry.cache_hits += 1;
                    telemetry.successes += 1;
                }
                debug!(tool = invocation.tool_name(), "Cache hit");
                self.observers.notify(|o| o.on_cache_hit(&invocation));
                self.record(&invocation, &output, start, TerminalState::Complete);
                return output;
            }
            lock(&self.telemetry).cache_misses += 1;
        }

        let output = tool.execute(&invocation).await;

        {
            let mut telemetry = lock(&self.telemetry);
            if output.success {
                telemetry.successes += 1;
            } else {
                telemetry.failures += 1;
            }
        }
        if let Some(key) = key {
            lock(&self.cache).insert(key, output.clone());
        }

        self.record(&invocation, &output, start, TerminalState::Complete);
        output
    }

    /// Build an invocation and dispatch it
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        context: InvocationContext,
    ) -> ToolOutput {
        self.dispatch(ToolInvocation::new(name, arguments, context))
            .await
    }

    fn record(
        &self,
        invocation: &ToolInvocation,
        output: &ToolOutput,
        start: Instant,
        terminal: TerminalState,
    ) {
        let record = ExecutionRecord::new(
            invocation.call_id(),
            invocation.tool_name(),
            output,
            start.elapsed().as_millis() as u64,
            terminal,
        );
        lock(&self.history).push(record);
    }

    // ==================== Batches ====================

    /// Fan out concurrently, at most `max_parallel` at a time.
    ///
    /// Every call settles; results come back in input order.
    pub async fn execute_parallel(
        &self,
        calls: Vec<BatchCall>,
        context: &InvocationContext,
    ) -> Vec<BatchResult> {
        self.dispatch_parallel(Self::invocations(calls, context))
            .await
    }

    /// Run in array order, one at a time
    pub async fn execute_sequence(
        &self,
        calls: Vec<BatchCall>,
        context: &InvocationContext,
        stop_on_error: bool,
    ) -> Vec<BatchResult> {
        self.dispatch_sequence(Self::invocations(calls, context), stop_on_error)
            .await
    }

    /// Parallel when every call is known, parallel-safe, and non-mutating
    /// for its arguments; otherwise sequential (without stopping on errors).
    pub async fn execute_smart(
        &self,
        calls: Vec<BatchCall>,
        context: &InvocationContext,
    ) -> Vec<BatchResult> {
        let invocations = Self::invocations(calls, context);

        let all_parallel = invocations.iter().all(|inv| {
            self.get_handler(inv.tool_name())
                .is_some_and(|h| h.spec().parallel_safe && !h.is_mutating(inv))
        });

        if all_parallel && invocations.len() > 1 {
            debug!(count = invocations.len(), "Smart batch: parallel");
            self.dispatch_parallel(invocations).await
        } else {
            debug!(count = invocations.len(), "Smart batch: sequential");
            self.dispatch_sequence(invocations, false).await
        }
    }

    fn invocations(calls: Vec<BatchCall>, context: &InvocationContext) -> Vec<ToolInvocation> {
        calls
            .into_iter()
            .map(|call| ToolInvocation::new(call.name, call.arguments, context.clone()))
            .collect()
    }

    async fn dispatch_parallel(&self, invocations: Vec<ToolInvocation>) -> Vec<BatchResult> {
        let max = self.params.max_parallel.max(1);
        stream::iter(invocations.into_iter().map(|inv| async move {
            let name = inv.tool_name().to_string();
            let call_id = inv.call_id().to_string();
            let output = self.dispatch(inv).await;
            BatchResult {
                name,
                call_id,
                output,
            }
        }))
        .buffered(max)
        .collect()
        .await
    }

    async fn dispatch_sequence(
        &self,
        invocations: Vec<ToolInvocation>,
        stop_on_error: bool,
    ) -> Vec<BatchResult> {
        let mut results = Vec::with_capacity(invocations.len());
        for inv in invocations {
            let name = inv.tool_name().to_string();
            let call_id = inv.call_id().to_string();
            let output = self.dispatch(inv).await;
            let failed = !output.success;
            results.push(BatchResult {
                name,
                call_id,
                output,
            });
            if failed && stop_on_error {
                break;
            }
        }
        results
    }

    // ==================== Discovery ====================

    /// Rank tools by relevance to `query` (see `toolgate_domain::tool::ranking`)
    pub fn select_tools(&self, query: &str, options: &SelectOptions) -> Vec<RankedTool> {
        let snapshot: Vec<Arc<RegisteredTool>> = read(&self.tools).values().cloned().collect();
        let metrics: Vec<ToolMetrics> = snapshot.iter().map(|t| t.metrics()).collect();

        let mut ranking = RankingQuery::new(query);
        if let Some(category) = &options.category {
            ranking = ranking.with_category(category.clone());
        }

        let scored = rank_tools(
            snapshot.iter().zip(&metrics).map(|(t, m)| (t.spec(), Some(m))),
            &ranking,
            options.limit,
        );

        scored
            .into_iter()
            .filter_map(|s| {
                snapshot
                    .iter()
                    .find(|t| t.spec().name == s.name)
                    .map(|t| RankedTool {
                        spec: t.spec().clone(),
                        score: s.score,
                    })
            })
            .collect()
    }

    /// Function-calling schemas for the whole catalog, in registration order
    pub fn export_schemas(&self) -> Vec<Value> {
        read(&self.tools)
            .values()
            .map(|t| t.spec().to_function_schema())
            .collect()
    }

    // ==================== Telemetry ====================

    pub fn stats(&self) -> RegistryStats {
        let telemetry = *lock(&self.telemetry);
        let tools = read(&self.tools).values().map(|t| t.stats()).collect();
        RegistryStats {
            total_calls: telemetry.total_calls,
            successes: telemetry.successes,
            failures: telemetry.failures,
            cache_hits: telemetry.cache_hits,
            cache_misses: telemetry.cache_misses,
            cache_size: lock(&self.cache).len(),
            history_size: lock(&self.history).len(),
            tools,
        }
    }

    /// Most recent dispatch records, oldest first
    pub fn history(&self, limit: usize) -> Vec<ExecutionRecord> {
        lock(&self.history).recent(limit)
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    pub fn prune_cache(&self) -> usize {
        lock(&self.cache).prune()
    }

    // ==================== Lifecycle ====================

    /// Cancel every in-flight execution; later executions fail as cancelled
    pub fn shutdown(&self) {
        info!(tools = self.len(), "Shutting down tool registry");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
