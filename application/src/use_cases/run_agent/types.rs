//! Type definitions for the RunAgent use case.

use crate::ports::ai_backend::BackendError;
use thiserror::Error;
use toolgate_domain::{AgentTurn, InvocationContext, ToolCallResult};

/// Errors that can occur during Agent execution
#[derive(Error, Debug)]
pub enum RunAgentError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Agent exceeded {0} turns without a final answer")]
    MaxTurnsExceeded(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RunAgentError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunAgentError::Cancelled)
    }
}

/// Input for the RunAgent use case
#[derive(Debug, Clone)]
pub struct RunAgentInput {
    /// The user's message
    pub message: String,
    /// Context attached to every tool invocation of the run
    pub context: InvocationContext,
}

impl RunAgentInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: InvocationContext::new(),
        }
    }

    pub fn with_context(mut self, context: InvocationContext) -> Self {
        self.context = context;
        self
    }
}

/// Output from the RunAgent use case
#[derive(Debug, Clone)]
pub struct RunAgentOutput {
    /// Final model text (the turn with no accepted tool calls)
    pub response: String,
    /// Number of backend round-trips
    pub turns: usize,
    /// Every dispatched call across all turns, in order
    pub tool_results: Vec<ToolCallResult>,
    /// Per-turn record
    pub transcript: Vec<AgentTurn>,
    /// Provider that produced the final answer
    pub provider: String,
}
