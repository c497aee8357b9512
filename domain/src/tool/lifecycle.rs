//! Invocation lifecycle states.
//!
//! ```text
//! Start ──▶ Approval ──▶ Execute(1) ──▶ Execute(n) ──▶ Complete
//!   │          │
//!   │          ├──▶ Rejected
//!   │          └──▶ ApprovalTimeout
//!   └──▶ NotFound
//! ```

use super::history::TerminalState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InvocationPhase {
    Start,
    Approval,
    /// 1-based attempt number
    Execute { attempt: u32 },
    Complete,
    Rejected,
    ApprovalTimeout,
    NotFound,
}

impl InvocationPhase {
    pub fn is_terminal(&self) -> bool {
        self.terminal_state().is_some()
    }

    pub fn terminal_state(&self) -> Option<TerminalState> {
        match self {
            InvocationPhase::Complete => Some(TerminalState::Complete),
            InvocationPhase::Rejected => Some(TerminalState::Rejected),
            InvocationPhase::ApprovalTimeout => Some(TerminalState::ApprovalTimeout),
            InvocationPhase::NotFound => Some(TerminalState::NotFound),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: InvocationPhase) -> bool {
        use InvocationPhase::*;
        match (self, next) {
            (Start, Approval | NotFound) => true,
            (Approval, Execute { attempt: 1 } | Rejected | ApprovalTimeout | NotFound) => true,
            (Execute { attempt }, Execute { attempt: next }) => next == attempt + 1,
            (Execute { .. }, Complete) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationPhase::Start => write!(f, "START"),
            InvocationPhase::Approval => write!(f, "APPROVAL"),
            InvocationPhase::Execute { attempt } => write!(f, "EXECUTE({})", attempt),
            InvocationPhase::Complete => write!(f, "COMPLETE"),
            InvocationPhase::Rejected => write!(f, "REJECTED"),
            InvocationPhase::ApprovalTimeout => write!(f, "APPROVAL_TIMEOUT"),
            InvocationPhase::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}
