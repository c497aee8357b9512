//! Domain layer for toolgate
//!
//! This crate contains the core entities, value objects, and pure policy
//! rules of the tool runtime. It has no dependencies on infrastructure or
//! presentation concerns, and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A tool is a named capability described by a [`ToolSpec`] and invoked with
//! a [`ToolInvocation`]. Every invocation ends in exactly one [`ToolOutput`].
//!
//! ## Invocation policy
//!
//! - **Approval**: [`ApprovalRequirement`] decides whether a call may run,
//!   must be confirmed, or is forbidden
//! - **Retry**: [`RetryPolicy`] retries only transient failures
//! - **Discovery**: [`rank_tools`] orders tools by relevance to a query
//!
//! ## Agent loop
//!
//! The agent asks for tools with ```` ```tool ```` fenced blocks, parsed by
//! [`extract_tool_calls`].

pub mod agent;
pub mod core;
pub mod prompt;
pub mod tool;

// Re-export commonly used types
pub use agent::{
    AcceptedToolCall, AgentTurn, RawToolCall, RejectedToolCall, RejectionReason,
    ToolCallExtraction, ToolCallResult, extract_tool_calls, screen_tool_calls,
};
pub use core::{
    clock::now_millis,
    config_issue::{ConfigIssue, ConfigIssueCode, Severity, has_errors},
    json::canonical_json,
    string::{single_line, truncate},
};
pub use prompt::AgentPromptTemplate;
pub use tool::{
    ApprovalDecision, ApprovalGrantKey, ApprovalRequest, ApprovalRequirement, Arguments,
    ContentItem, ErrorCode, ExecutionRecord, FailureClass, HistoryBuffer, InvocationContext,
    InvocationPhase, ParamType, RankingQuery, RetryPolicy, ScoredTool, TerminalState, ToolError,
    ToolInvocation, ToolKind, ToolMetrics, ToolOutput, ToolParameter, ToolSpec, ToolStats,
    ValidationReport, classify_failure, rank_tools, validate_arguments,
};
