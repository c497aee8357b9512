//! Progress reporting for tool executions and agent turns
//!
//! Everything goes to stderr so stdout stays clean for results and `--json`.

use colored::Colorize;
use std::time::Duration;
use toolgate_application::{AgentProgressNotifier, ToolObserver};
use toolgate_domain::{
    ApprovalDecision, ApprovalRequest, RejectedToolCall, ToolCallResult, ToolInvocation,
    ToolOutput, single_line, truncate,
};

/// Longest error or response preview printed on one line
const PREVIEW_LEN: usize = 120;

/// Prints one line per tool lifecycle event
pub struct ConsoleToolObserver {
    quiet: bool,
}

impl ConsoleToolObserver {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Only report failures and retries
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn format_start(invocation: &ToolInvocation) -> String {
        format!(
            "{} {} {}",
            "->".cyan(),
            invocation.tool_name().bold(),
            short_id(invocation.call_id()).dimmed()
        )
    }

    fn format_complete(invocation: &ToolInvocation, elapsed: Duration) -> String {
        format!(
            "  {} {} ({}ms)",
            "v".green(),
            invocation.tool_name(),
            elapsed.as_millis()
        )
    }

    fn format_error(invocation: &ToolInvocation, error: &str, elapsed: Duration) -> String {
        format!(
            "  {} {} ({}ms): {}",
            "x".red(),
            invocation.tool_name(),
            elapsed.as_millis(),
            truncate(&single_line(error), PREVIEW_LEN).red()
        )
    }

    fn format_retry(
        invocation: &ToolInvocation,
        attempt: u32,
        delay: Duration,
        error: &str,
    ) -> String {
        format!(
            "  {} {} attempt {} failed, retrying in {}ms: {}",
            "~".yellow(),
            invocation.tool_name(),
            attempt,
            delay.as_millis(),
            truncate(&single_line(error), PREVIEW_LEN).dimmed()
        )
    }
}

impl Default for ConsoleToolObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn short_id(call_id: &str) -> String {
    format!("[{}]", call_id.chars().take(8).collect::<String>())
}

impl ToolObserver for ConsoleToolObserver {
    fn on_start(&self, invocation: &ToolInvocation) {
        if !self.quiet {
            eprintln!("{}", Self::format_start(invocation));
        }
    }

    fn on_complete(&self, invocation: &ToolInvocation, _output: &ToolOutput, elapsed: Duration) {
        if !self.quiet {
            eprintln!("{}", Self::format_complete(invocation, elapsed));
        }
    }

    fn on_error(&self, invocation: &ToolInvocation, error: &str, elapsed: Duration) {
        eprintln!("{}", Self::format_error(invocation, error, elapsed));
    }

    fn on_cache_hit(&self, invocation: &ToolInvocation) {
        if !self.quiet {
            eprintln!(
                "  {} {} (cached)",
                "v".green(),
                invocation.tool_name()
            );
        }
    }

    fn on_approval_decision(&self, request: &ApprovalRequest, decision: &ApprovalDecision) {
        if !decision.is_approving() {
            eprintln!(
                "  {} {} {}",
                "x".red(),
                request.tool_name,
                decision.label().red()
            );
        }
    }

    fn on_retry(&self, invocation: &ToolInvocation, attempt: u32, delay: Duration, error: &str) {
        eprintln!("{}", Self::format_retry(invocation, attempt, delay, error));
    }
}

/// Prints agent turns
pub struct AgentProgressReporter;

impl AgentProgressReporter {
    fn format_rejected(rejected: &RejectedToolCall) -> String {
        format!(
            "  {} ignored call to '{}': {}",
            "!".yellow(),
            rejected.name,
            rejected.reason
        )
    }
}

impl AgentProgressNotifier for AgentProgressReporter {
    fn on_turn_start(&self, turn: usize, max_turns: usize) {
        eprintln!(
            "{} {}",
            "=>".cyan(),
            format!("Turn {}/{}", turn, max_turns).bold()
        );
    }

    fn on_malformed_block(&self, reason: &str) {
        eprintln!(
            "  {} malformed tool block: {}",
            "!".yellow(),
            truncate(&single_line(reason), PREVIEW_LEN)
        );
    }

    fn on_tool_rejected(&self, rejected: &RejectedToolCall) {
        eprintln!("{}", Self::format_rejected(rejected));
    }

    fn on_tool_result(&self, result: &ToolCallResult) {
        if !result.output.success {
            eprintln!(
                "  {} {} returned an error to the model",
                "x".red(),
                result.name
            );
        }
    }

    fn on_final_answer(&self, turns: usize, _response: &str) {
        eprintln!("{} {}", "=>".cyan(), format!("Answered after {} turn(s)", turns).green());
    }
}
