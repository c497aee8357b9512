//! Tool-call extraction from model text.
//!
//! The model requests tools with fenced blocks labelled `tool`:
//!
//! ````text
//! ```tool
//! {"name": "echo", "arguments": {"message": "hi"}}
//! ```
//! ````
//!
//! Nothing else in the response is treated as a tool call, including bare
//! JSON and blocks with any other label.

use crate::core::json::canonical_json;
use crate::tool::entities::Arguments;
use serde_json::Value;

/// Fence label that marks a tool-call block
pub const TOOL_FENCE: &str = "```tool";

const FENCE: &str = "```";

/// A syntactically valid tool-call block, not yet checked against the registry
#[derive(Debug, Clone, PartialEq)]
pub struct RawToolCall {
    pub name: String,
    /// Raw `arguments` value; `{}` when the field is absent
    pub arguments: Value,
}

/// Everything found in one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallExtraction {
    pub calls: Vec<RawToolCall>,
    /// Human-readable reasons for blocks that could not be parsed
    pub malformed: Vec<String>,
}

/// A call that passed screening
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedToolCall {
    pub name: String,
    pub arguments: Arguments,
}

/// Why a candidate was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    UnknownTool,
    ArgumentsNotObject,
    Duplicate,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::UnknownTool => write!(f, "unknown tool"),
            RejectionReason::ArgumentsNotObject => write!(f, "arguments must be a JSON object"),
            RejectionReason::Duplicate => write!(f, "duplicate call in the same turn"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedToolCall {
    pub name: String,
    pub reason: RejectionReason,
}

/// Scan `text` for ```` ```tool ```` blocks.
pub fn extract_tool_calls(text: &str) -> ToolCallExtraction {
    let mut extraction = ToolCallExtraction::default();
    let mut in_block = false;
    let mut current = String::new();

    for line in text.lines() {
        let trimmed = line.trim();

        if !in_block {
            let Some(rest) = trimmed.strip_prefix(TOOL_FENCE) else {
                continue;
            };
            // ```toolbox and friends are not ours
            if rest.chars().next().is_some_and(|c| !c.is_whitespace() && c != '{') {
                continue;
            }
            let rest = rest.trim();
            // single-line form: ```tool {...}```
            if let Some(body) = rest.strip_suffix(FENCE) {
                push_block(body, &mut extraction);
                continue;
            }
            in_block = true;
            current.clear();
            current.push_str(rest);
            current.push('\n');
        } else if let Some(body) = trimmed.strip_suffix(FENCE) {
            in_block = false;
            current.push_str(body);
            push_block(&current, &mut extraction);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }

    if in_block {
        extraction
            .malformed
            .push("Unclosed tool block".to_string());
    }

    extraction
}

fn push_block(body: &str, extraction: &mut ToolCallExtraction) {
    match parse_block(body) {
        Ok(call) => extraction.calls.push(call),
        Err(reason) => extraction.malformed.push(reason),
    }
}

fn parse_block(body: &str) -> Result<RawToolCall, String> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| format!("Invalid JSON in tool block: {}", e))?;

    let Value::Object(mut object) = value else {
        return Err("Tool block is not a JSON object".to_string());
    };

    let name = match object.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => return Err("Tool block is missing a string \"name\"".to_string()),
    };

    let arguments = object
        .remove("arguments")
        .unwrap_or_else(|| Value::Object(Arguments::new()));

    Ok(RawToolCall { name, arguments })
}

/// Drop unknown tools, non-object arguments, and exact duplicates.
///
/// Order of first occurrence is preserved for accepted calls.
pub fn screen_tool_calls(
    calls: Vec<RawToolCall>,
    is_known: impl Fn(&str) -> bool,
) -> (Vec<AcceptedToolCall>, Vec<RejectedToolCall>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut seen: Vec<(String, String)> = Vec::new();

    for call in calls {
        if !is_known(&call.name) {
            rejected.push(RejectedToolCall {
                name: call.name,
                reason: RejectionReason::UnknownTool,
            });
            continue;
        }

        let Value::Object(arguments) = call.arguments else {
            rejected.push(RejectedToolCall {
                name: call.name,
                reason: RejectionReason::ArgumentsNotObject,
            });
            continue;
        };

        let key = (
            call.name.clone(),
            canonical_json(&Value::Object(arguments.clone())),
        );
        if seen.contains(&key) {
            rejected.push(RejectedToolCall {
                name: call.name,
                reason: RejectionReason::Duplicate,
            });
            continue;
        }
        seen.push(key);

        accepted.push(AcceptedToolCall {
            name: call.name,
            arguments,
        });
    }

    (accepted, rejected)
}
