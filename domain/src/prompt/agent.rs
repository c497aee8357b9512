//! Prompt templates for the agent loop

use crate::agent::entities::ToolCallResult;
use crate::core::string::truncate;
use serde_json::Value;

/// Longest tool output echoed back to the model, in bytes
pub const MAX_RESULT_CHARS: usize = 8 * 1024;

const DEFAULT_BASE_PROMPT: &str =
    "You are a helpful assistant that can call tools to get information or take actions.";

/// Templates for generating agent prompts
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt embedding the exported tool schemas
    pub fn system_prompt(base: Option<&str>, schemas: &[Value]) -> String {
        let base = base.unwrap_or(DEFAULT_BASE_PROMPT);

        if schemas.is_empty() {
            return base.to_string();
        }

        let tool_descriptions = schemas
            .iter()
            .map(Self::describe_schema)
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"{base}

## Available Tools

{tool_descriptions}

## How to Use Tools

To call a tool, reply with one fenced block per call in exactly this format:

```tool
{{"name": "tool_name", "arguments": {{"param": "value"}}}}
```

You may request several tools in one reply. Their results will be sent back to you.
When you have everything you need, answer in plain text without any tool blocks."#
        )
    }

    fn describe_schema(schema: &Value) -> String {
        let name = schema["name"].as_str().unwrap_or("unknown");
        let description = schema["description"].as_str().unwrap_or("");
        let required: Vec<&str> = schema["parameters"]["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let params = schema["parameters"]["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(param, def)| {
                        let marker = if required.contains(&param.as_str()) {
                            " (required)"
                        } else {
                            ""
                        };
                        format!(
                            "    - {} ({}): {}{}",
                            param,
                            def["type"].as_str().unwrap_or("string"),
                            def["description"].as_str().unwrap_or(""),
                            marker
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if params.is_empty() {
            format!("- **{}**: {}\n  Parameters: none", name, description)
        } else {
            format!(
                "- **{}**: {}\n  Parameters:\n{}",
                name,
                description,
                params.join("\n")
            )
        }
    }

    /// Feedback message carrying the results of one turn's calls
    pub fn tool_results(results: &[ToolCallResult]) -> String {
        let sections = results
            .iter()
            .map(|r| {
                let status = if r.output.success { "Success" } else { "Failed" };
                format!(
                    "## {}\nStatus: {}\nOutput: {}",
                    r.name,
                    status,
                    truncate(&r.output.content_text(), MAX_RESULT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("Tool execution results:\n\n{}", sections)
    }
}
