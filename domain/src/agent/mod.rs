//! Agent domain module
//!
//! Pure pieces of the agent loop: tool-call extraction from model text and
//! the records of each turn.

pub mod entities;
pub mod tool_call_parser;

pub use entities::{AgentTurn, ToolCallResult};
pub use tool_call_parser::{
    AcceptedToolCall, RawToolCall, RejectedToolCall, RejectionReason, ToolCallExtraction,
    extract_tool_calls, screen_tool_calls,
};
