//! Application layer for toolgate
//!
//! This crate contains the tool runtime (registry and orchestrator), the agent
//! loop use case, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
mod sync;
pub mod tooling;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AgentParams, OrchestratorParams, RegistryParams};
pub use ports::{
    agent_progress::{AgentProgressNotifier, NoAgentProgress},
    ai_backend::{AiBackend, AiResponse, BackendError, TokenUsage},
    approval_handler::{ApprovalError, ApprovalHandler, AutoApproveHandler, AutoDenyHandler},
    browser_driver::{BrowserDriver, BrowserError},
    execution_logger::{ExecutionLogger, NoExecutionLogger},
    tool_handler::ToolHandler,
    tool_observer::{NoToolObserver, ToolObserver},
};
pub use tooling::{
    BatchCall, BatchResult, ObserverSet, RankedTool, RegisteredTool, RegistryError,
    RegistryStats, SelectOptions, ToolRegistry,
};
pub use use_cases::orchestrator::{OrchestratorStats, ToolOrchestrator};
pub use use_cases::run_agent::{RunAgentError, RunAgentInput, RunAgentOutput, RunAgentUseCase};
