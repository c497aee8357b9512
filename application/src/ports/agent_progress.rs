//! Agent loop progress port.
//!
//! [`AgentProgressNotifier`] is an **output port** that the presentation layer
//! implements to show the agent loop turn by turn. Tool-level detail comes
//! through `ToolObserver`; this port covers the model side.
//!
//! # Example Implementation
//!
//! ```ignore
//! use toolgate_application::ports::agent_progress::AgentProgressNotifier;
//!
//! struct MyProgress;
//!
//! impl AgentProgressNotifier for MyProgress {
//!     fn on_turn_start(&self, turn: usize, max_turns: usize) {
//!         println!("Turn {}/{}", turn, max_turns);
//!     }
//! }
//! ```

use toolgate_domain::{RejectedToolCall, ToolCallResult};

/// All methods default to no-ops.
pub trait AgentProgressNotifier: Send + Sync {
    /// Called before the backend is asked for turn `turn` (1-based)
    fn on_turn_start(&self, _turn: usize, _max_turns: usize) {}

    /// Called with the raw model text of a turn
    fn on_model_response(&self, _turn: usize, _text: &str) {}

    /// Called for each fenced block that could not be parsed
    fn on_malformed_block(&self, _reason: &str) {}

    /// Called for each candidate dropped during screening
    fn on_tool_rejected(&self, _rejected: &RejectedToolCall) {}

    /// Called after each accepted call finishes
    fn on_tool_result(&self, _result: &ToolCallResult) {}

    /// Called once with the final answer
    fn on_final_answer(&self, _turns: usize, _response: &str) {}
}

/// No-op notifier
pub struct NoAgentProgress;

impl AgentProgressNotifier for NoAgentProgress {}
