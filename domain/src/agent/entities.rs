//! Agent loop entities

use crate::tool::entities::Arguments;
use crate::tool::value_objects::ToolOutput;
use serde::{Deserialize, Serialize};

/// A dispatched tool call and its terminal output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub name: String,
    pub arguments: Arguments,
    pub output: ToolOutput,
}

/// One round-trip with the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTurn {
    /// 1-based turn number
    pub turn: usize,
    /// Raw model text for this turn
    pub response: String,
    pub calls: Vec<ToolCallResult>,
    /// Candidates dropped during screening, as `name: reason`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}
