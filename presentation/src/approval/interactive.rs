//! Interactive approval prompt for the terminal.
//!
//! When a tool call needs approval, the user sees:
//!
//! ```text
//! ── Approval required ──────────────────────────────
//!   Tool:      shell  (mutating)
//!   Reason:    Run shell command: rm -rf build
//!   Arguments: {"command": "rm -rf build"}
//!
//!   [y] approve  [s] approve for session  [n] deny  [q] abort
//! approve?>
//! ```
//!
//! | Input | Aliases | Decision |
//! |-------|---------|----------|
//! | `y` | `yes`, `a`, `approve` | `Approved` |
//! | `s` | `session` | `ApprovedForSession` |
//! | `n` | `no`, `d`, `deny` | `Denied` |
//! | `q` | `quit`, `abort` | `Abort` |

use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use toolgate_application::{ApprovalError, ApprovalHandler};
use toolgate_domain::{ApprovalDecision, ApprovalRequest, truncate};

/// Longest argument preview shown in the prompt
const MAX_ARGS_PREVIEW: usize = 400;

/// Terminal-based [`ApprovalHandler`].
///
/// Prompts are serialized: concurrent requests (parallel batches) queue up
/// instead of interleaving on the terminal.
pub struct InteractiveApprovalHandler {
    prompt_lock: tokio::sync::Mutex<()>,
}

impl InteractiveApprovalHandler {
    pub fn new() -> Self {
        Self {
            prompt_lock: tokio::sync::Mutex::new(()),
        }
    }
}

impl Default for InteractiveApprovalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the prompt header for `request`
pub fn render_request(request: &ApprovalRequest) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "{}\n",
        "── Approval required ──────────────────────────────"
            .yellow()
            .bold()
    ));

    let mutating = if request.mutating {
        format!("  {}", "(mutating)".red())
    } else {
        String::new()
    };
    out.push_str(&format!(
        "  {}      {}{}\n",
        "Tool:".cyan().bold(),
        request.tool_name.bold(),
        mutating
    ));
    if !request.description.is_empty() {
        out.push_str(&format!(
            "  {}      {}\n",
            "What:".cyan().bold(),
            request.description
        ));
    }
    if let Some(reason) = &request.reason {
        out.push_str(&format!("  {}    {}\n", "Reason:".cyan().bold(), reason));
    }
    if let Some(session) = &request.context.session_id {
        out.push_str(&format!(
            "  {}   {}\n",
            "Session:".cyan().bold(),
            session.dimmed()
        ));
    }
    let args = serde_json::to_string(&request.arguments).unwrap_or_default();
    out.push_str(&format!(
        "  {} {}\n\n",
        "Arguments:".cyan().bold(),
        truncate(&args, MAX_ARGS_PREVIEW)
    ));
    out.push_str(&format!(
        "  {} approve  {} approve for session  {} deny  {} abort\n",
        "[y]".green(),
        "[s]".green(),
        "[n]".red(),
        "[q]".red()
    ));
    out
}

/// Map one line of input to a decision. `None` means "ask again".
pub fn parse_decision(input: &str) -> Option<ApprovalDecision> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" | "a" | "approve" => Some(ApprovalDecision::Approved),
        "s" | "session" => Some(ApprovalDecision::ApprovedForSession),
        "n" | "no" | "d" | "deny" => Some(ApprovalDecision::Denied { reason: None }),
        "q" | "quit" | "abort" => Some(ApprovalDecision::Abort {
            reason: Some("Aborted by user".to_string()),
        }),
        _ => None,
    }
}

/// Blocking prompt loop over any line source
fn prompt_loop(
    header: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<ApprovalDecision, ApprovalError> {
    let io_err = |e: io::Error| ApprovalError::IoError(e.to_string());

    write!(output, "{}", header).map_err(io_err)?;
    loop {
        write!(output, "{} ", "approve?>".magenta().bold()).map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            // stdin closed
            return Err(ApprovalError::Cancelled);
        }

        if let Some(decision) = parse_decision(&line) {
            let label = if decision.is_approving() {
                format!("✓ {}", decision.label()).green()
            } else {
                format!("✗ {}", decision.label()).red()
            };
            writeln!(output, "{}", label).map_err(io_err)?;
            return Ok(decision);
        }
        if !line.trim().is_empty() {
            writeln!(
                output,
                "{} Unknown choice: {} (use y, s, n, or q)",
                "⚠️".yellow(),
                line.trim().red()
            )
            .map_err(io_err)?;
        }
    }
}

#[async_trait]
impl ApprovalHandler for InteractiveApprovalHandler {
    fn name(&self) -> &str {
        "interactive"
    }

    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ApprovalError> {
        let _guard = self.prompt_lock.lock().await;
        let header = render_request(request);

        // stdin reads block; keep them off the async workers
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stderr();
            prompt_loop(&header, &mut input, &mut output)
        })
        .await
        .map_err(|e| ApprovalError::IoError(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use toolgate_domain::{Arguments, InvocationContext, ToolInvocation};

    fn request() -> ApprovalRequest {
        let mut args = Arguments::new();
        args.insert("command".into(), "rm -rf build".into());
        let inv = ToolInvocation::new("shell", args, InvocationContext::new().with_session("s1"));
        ApprovalRequest::new(
            &inv,
            "Execute a shell command",
            Some("Run shell command: rm -rf build".into()),
            true,
        )
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("y\n"), Some(ApprovalDecision::Approved));
        assert_eq!(parse_decision(" YES "), Some(ApprovalDecision::Approved));
        assert_eq!(
            parse_decision("s"),
            Some(ApprovalDecision::ApprovedForSession)
        );
        assert_eq!(
            parse_decision("deny"),
            Some(ApprovalDecision::Denied { reason: None })
        );
        assert!(matches!(
            parse_decision("q"),
            Some(ApprovalDecision::Abort { .. })
        ));
        assert_eq!(parse_decision(""), None);
        assert_eq!(parse_decision("maybe"), None);
    }

    #[test]
    fn test_render_request_shows_details() {
        colored::control::set_override(false);
        let text = render_request(&request());
        assert!(text.contains("shell"));
        assert!(text.contains("(mutating)"));
        assert!(text.contains("Run shell command: rm -rf build"));
        assert!(text.contains("s1"));
        assert!(text.contains(r#""command":"rm -rf build""#));
    }

    #[test]
    fn test_prompt_loop_retries_until_valid() {
        let mut input = Cursor::new("\nwhat\ns\n");
        let mut output = Vec::new();
        let decision = prompt_loop("header\n", &mut input, &mut output).unwrap();
        assert_eq!(decision, ApprovalDecision::ApprovedForSession);

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.starts_with("header\n"));
        assert!(printed.contains("Unknown choice"));
    }

    #[test]
    fn test_closed_input_cancels() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let err = prompt_loop("", &mut input, &mut output).unwrap_err();
        assert!(matches!(err, ApprovalError::Cancelled));
    }
}
