//! Tool domain module
//!
//! This module defines the core abstractions of the **tool runtime**: what a
//! tool is, what one request to run it looks like, what it returns, and the
//! pure policy rules (validation, approval, retry, ranking) applied around it.
//!
//! # Overview
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolInvocation │───▶│ ToolOutput   │
//! │ (catalog)    │    │ (one request)  │    │ (terminal)   │
//! └──────┬───────┘    └───────┬────────┘    └──────┬───────┘
//!        │                    │                    │
//!        ├─ validation        ├─ approval          ├─ retry classification
//!        └─ ranking           └─ lifecycle         └─ history / metrics
//! ```
//!
//! # Tool Kinds
//!
//! | Kind | Implemented by | Typical flags |
//! |------|----------------|---------------|
//! | `function` | in-process async closure | parallel-safe, non-mutating |
//! | `shell` | external command | mutating unless whitelisted, needs approval |
//! | `browser` | browser driver adapter | not parallel-safe |
//! | `external` | remote HTTP endpoint | depends on the remote tool |
//!
//! # Key Types
//!
//! - [`ToolSpec`]: declarative description of a tool (schema, kind, flags)
//! - [`ToolInvocation`]: immutable request with call id and context
//! - [`ToolOutput`]: success payload or normalized failure
//! - [`ToolError`] / [`ErrorCode`]: typed handler failures
//! - [`ApprovalRequirement`] / [`ApprovalDecision`]: approval gate inputs and outputs
//! - [`RetryPolicy`]: backoff math and transient classification
//! - [`HistoryBuffer`]: bounded ring of [`ExecutionRecord`]s
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application** (`ToolHandler`, `ToolRegistry`, `ToolOrchestrator`): execution
//! - **Infrastructure**: concrete handlers (function, shell, browser, remote)

pub mod approval;
pub mod entities;
pub mod history;
pub mod lifecycle;
pub mod metrics;
pub mod ranking;
pub mod retry;
pub mod validation;
pub mod value_objects;

pub use approval::{ApprovalDecision, ApprovalGrantKey, ApprovalRequest, ApprovalRequirement};
pub use entities::{
    Arguments, InvocationContext, ParamType, ToolInvocation, ToolKind, ToolParameter, ToolSpec,
};
pub use history::{ExecutionRecord, HistoryBuffer, TerminalState};
pub use lifecycle::InvocationPhase;
pub use metrics::{ToolMetrics, ToolStats};
pub use ranking::{RankingQuery, ScoredTool, rank_tools};
pub use retry::{FailureClass, RetryPolicy, classify_failure};
pub use validation::{ValidationReport, validate_arguments};
pub use value_objects::{ContentItem, ErrorCode, ToolError, ToolOutput};
