//! Shell tool: run a command through `sh -c`
//!
//! A call is read-only only when the first word of `command` is listed in
//! `read_only_commands` and the command holds no shell metacharacter
//! (chaining, redirection, substitution, globbing). The child runs
//! in its own process group so a timeout or shutdown can kill the whole tree.

use crate::config::{DEFAULT_SHELL_COMMANDS, FileShellConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use toolgate_application::ToolHandler;
use toolgate_domain::{
    ApprovalRequirement, ParamType, ToolError, ToolInvocation, ToolKind, ToolOutput,
    ToolParameter, ToolSpec, truncate,
};
use tracing::debug;

/// Tool name constant
pub const SHELL: &str = "shell";

/// Maximum output size kept in the result (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

const EMPTY_OUTPUT: &str = "Command completed successfully";

/// Characters that let `sh -c` run more than the first word suggests
const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '[', ']', '<', '>', '\\', '!', '#', '*', '?',
    '"', '\'', '\n', '\r',
];

pub struct ShellHandler {
    spec: ToolSpec,
    read_only_commands: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Default for ShellHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellHandler {
    pub fn new() -> Self {
        let spec = ToolSpec::new(SHELL, "Execute a shell command and return its output")
            .with_kind(ToolKind::Shell)
            .with_category("system")
            .with_mutating(true)
            .with_requires_approval(true)
            .with_parameter(ToolParameter::new("command", "The command to execute", true))
            .with_parameter(ToolParameter::new(
                "working_dir",
                "Working directory for the command",
                false,
            ))
            .with_parameter(
                ToolParameter::new("timeout_ms", "Per-call timeout in milliseconds", false)
                    .with_type(ParamType::Integer),
            );

        Self {
            spec,
            read_only_commands: DEFAULT_SHELL_COMMANDS.iter().map(|s| s.to_string()).collect(),
            working_dir: None,
        }
    }

    pub fn from_config(config: &FileShellConfig) -> Self {
        let mut handler = Self::new()
            .with_read_only_commands(config.read_only_commands.clone())
            .with_requires_approval(config.require_approval)
            .with_timeout(Duration::from_secs(config.timeout_secs));
        if let Some(dir) = &config.working_dir {
            handler = handler.with_working_dir(dir);
        }
        handler
    }

    pub fn with_read_only_commands(mut self, commands: Vec<String>) -> Self {
        self.read_only_commands = commands;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_requires_approval(mut self, requires_approval: bool) -> Self {
        self.spec.requires_approval = requires_approval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    fn is_read_only(&self, command: &str) -> bool {
        if command.contains(SHELL_METACHARACTERS) {
            return false;
        }
        command
            .split_whitespace()
            .next()
            .is_some_and(|first| self.read_only_commands.iter().any(|c| c == first))
    }

    fn resolve_working_dir(
        &self,
        invocation: &ToolInvocation,
    ) -> Result<Option<PathBuf>, ToolError> {
        let dir = match invocation.get_string("working_dir") {
            Some(dir) => Some(PathBuf::from(dir)),
            None => self.working_dir.clone(),
        };
        if let Some(path) = &dir
            && !Path::new(path).is_dir()
        {
            return Err(ToolError::validation(format!(
                "Working directory does not exist: {}",
                path.display()
            )));
        }
        Ok(dir)
    }
}

#[async_trait]
impl ToolHandler for ShellHandler {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn is_mutating(&self, invocation: &ToolInvocation) -> bool {
        !self.is_read_only(invocation.get_string("command").unwrap_or_default())
    }

    fn approval_requirement(&self, invocation: &ToolInvocation) -> ApprovalRequirement {
        let command = invocation.get_string("command").unwrap_or_default();
        if self.spec.requires_approval {
            ApprovalRequirement::needs_approval(format!("Run shell command: {}", command))
        } else if self.is_mutating(invocation) {
            ApprovalRequirement::needs_approval(format!(
                "Shell command may modify the system: {}",
                command
            ))
        } else {
            ApprovalRequirement::Skip
        }
    }

    async fn handle(
        &self,
        invocation: &ToolInvocation,
        cancel: CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let command = invocation
            .require_string("command")
            .map_err(ToolError::validation)?;
        let working_dir = self.resolve_working_dir(invocation)?;
        let per_call = invocation
            .get_i64("timeout_ms")
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64));

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = &working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| ToolError::execution_failed(format!("Failed to spawn command: {}", e)))?;
        let pid = child.id();
        debug!(pid, command, "Spawned shell command");

        let deadline = async {
            match per_call {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|e| {
                ToolError::execution_failed(format!("Failed to wait for command: {}", e))
            })?,
            _ = cancel.cancelled() => {
                kill_process_group(pid);
                return Err(ToolError::cancelled(invocation.tool_name()));
            }
            _ = deadline => {
                kill_process_group(pid);
                let ms = per_call.map(|d| d.as_millis() as u64).unwrap_or_default();
                return Err(ToolError::timeout(ms));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr_value = if stderr.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::String(truncate(&stderr, MAX_OUTPUT_SIZE))
        };

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(ToolError::execution_failed(format!(
                "Command failed with exit code {}: {}",
                exit_code,
                truncate(detail, MAX_OUTPUT_SIZE)
            ))
            .with_detail("exit_code", exit_code)
            .with_detail("stderr", stderr_value));
        }

        let content = if !stdout.is_empty() {
            truncate(&stdout, MAX_OUTPUT_SIZE)
        } else if !stderr.is_empty() {
            truncate(&stderr, MAX_OUTPUT_SIZE)
        } else {
            EMPTY_OUTPUT.to_string()
        };

        Ok(ToolOutput::success(content)
            .with_metadata("exit_code", exit_code)
            .with_metadata("stderr", stderr_value))
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: killpg only sends a signal; the child leads its own group (process_group(0))
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
