//! Tool configuration from TOML (`[shell]`, `[[remote_tools]]` sections)
//!
//! Example configuration:
//!
//! ```toml
//! [shell]
//! enabled = true
//! read_only_commands = ["ls", "pwd", "cat"]
//! require_approval = true
//! working_dir = "/srv/data"
//!
//! [[remote_tools]]
//! name = "lookup_user"
//! description = "Look up a user in the directory service"
//! endpoint = "http://localhost:8080/tools/lookup_user"
//! category = "directory"
//!
//! [[remote_tools.parameters]]
//! name = "email"
//! description = "Email address"
//! required = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use toolgate_domain::{ConfigIssue, ConfigIssueCode};

/// Commands treated as read-only when no list is configured
pub const DEFAULT_SHELL_COMMANDS: &[&str] = &[
    "ls", "pwd", "echo", "cat", "head", "tail", "grep", "which", "whoami",
];

/// Raw shell tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileShellConfig {
    pub enabled: bool,
    /// First words of commands treated as non-mutating
    pub read_only_commands: Vec<String>,
    pub require_approval: bool,
    pub working_dir: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileShellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_only_commands: DEFAULT_SHELL_COMMANDS.iter().map(|s| s.to_string()).collect(),
            require_approval: true,
            working_dir: None,
            timeout_secs: 30,
        }
    }
}

impl FileShellConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.enabled && self.read_only_commands.is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingValue {
                    field: "shell.read_only_commands".to_string(),
                },
                "shell.read_only_commands is empty, every shell command will be treated as mutating",
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "shell.timeout_secs".to_string(),
                },
                "shell.timeout_secs: 0 times out every command",
            ));
        }
        issues
    }
}

/// One declared parameter of a remote tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToolParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// JSON type name (`string`, `number`, `integer`, `boolean`, `array`, `object`)
    #[serde(default = "default_param_type", rename = "type")]
    pub param_type: String,
}

fn default_param_type() -> String {
    "string".to_string()
}

/// A tool served by an HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRemoteToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub mutating: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub parameters: Vec<FileToolParameter>,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

pub fn validate_remote_tools(tools: &[FileRemoteToolConfig]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for tool in tools {
        if tool.endpoint.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: format!("remote_tools.{}.endpoint", tool.name),
                },
                format!("remote tool '{}' has no endpoint", tool.name),
            ));
        }
        if !seen.insert(tool.name.as_str()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::DuplicateTool {
                    name: tool.name.clone(),
                },
                format!("remote tool '{}' is declared more than once", tool.name),
            ));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_tool_from_toml() {
        let toml_str = r#"
name = "lookup"
endpoint = "http://localhost:8080/lookup"
mutating = true

[[parameters]]
name = "email"
required = true
"#;
        let tool: FileRemoteToolConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(tool.name, "lookup");
        assert!(tool.mutating);
        assert_eq!(tool.parameters[0].param_type, "string");
        assert!(tool.parameters[0].required);
    }

    #[test]
    fn test_remote_tool_issues() {
        let tool = FileRemoteToolConfig {
            name: "a".into(),
            description: String::new(),
            endpoint: " ".into(),
            category: None,
            timeout_secs: None,
            mutating: false,
            requires_approval: false,
            parameters: vec![],
            headers: BTreeMap::new(),
        };
        let issues = validate_remote_tools(&[tool.clone(), tool]);
        // two missing endpoints, one duplicate
        assert_eq!(issues.len(), 3);
        assert!(toolgate_domain::has_errors(&issues));
    }

    #[test]
    fn test_empty_whitelist_warns() {
        let config = FileShellConfig {
            read_only_commands: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 1);
    }
}
