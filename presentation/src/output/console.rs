//! Console output formatter for tool catalogs, outputs, and statistics

use colored::Colorize;
use toolgate_application::{OrchestratorStats, RankedTool, RegistryStats, RunAgentOutput};
use toolgate_domain::{ConfigIssue, Severity, ToolOutput, ToolSpec, truncate};

/// Formats runtime results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per tool: name, kind, category, flags, description
    pub fn format_tools(specs: &[ToolSpec]) -> String {
        if specs.is_empty() {
            return format!("{}\n", "No tools registered.".dimmed());
        }

        let width = specs.iter().map(|s| s.name.len()).max().unwrap_or(0);
        let mut output = Self::header(&format!("Tools ({})", specs.len()));
        for spec in specs {
            output.push_str(&format!(
                "  {:<width$}  {:<8} {:<10} {:<5} {}\n",
                spec.name.bold(),
                spec.kind.as_str(),
                truncate(&spec.category, 10),
                Self::flags(spec),
                spec.description.dimmed(),
                width = width
            ));
        }
        output.push_str(&format!(
            "\n  {}\n",
            "flags: m = mutating, a = requires approval, s = serial only".dimmed()
        ));
        output
    }

    fn flags(spec: &ToolSpec) -> String {
        let mut flags = String::new();
        flags.push(if spec.mutating { 'm' } else { '-' });
        flags.push(if spec.requires_approval { 'a' } else { '-' });
        flags.push(if spec.parallel_safe { '-' } else { 's' });
        flags
    }

    pub fn format_ranked(query: &str, ranked: &[RankedTool]) -> String {
        let mut output = Self::header(&format!("Discovery: \"{}\"", query));
        if ranked.is_empty() {
            output.push_str(&format!("  {}\n", "No matching tools.".dimmed()));
            return output;
        }
        for (i, hit) in ranked.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} {} {}\n",
                i + 1,
                hit.spec.name.bold(),
                format!("({:.1})", hit.score).yellow(),
                hit.spec.description.dimmed()
            ));
        }
        output
    }

    /// Terminal output of one invocation
    pub fn format_output(tool: &str, output: &ToolOutput) -> String {
        let mut text = String::new();
        if output.success {
            text.push_str(&format!("{} {}\n", "✓".green().bold(), tool.bold()));
        } else {
            let code = output
                .error_code()
                .map(|c| c.as_str())
                .unwrap_or("ERROR");
            text.push_str(&format!(
                "{} {} {}\n",
                "✗".red().bold(),
                tool.bold(),
                format!("[{}]", code).red()
            ));
        }

        let content = match &output.content {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        text.push_str(content.trim_end());
        text.push('\n');

        let extra: Vec<String> = output
            .metadata
            .iter()
            .filter(|(key, value)| key.as_str() != "code" && !value.is_null())
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        if !extra.is_empty() {
            text.push_str(&format!("{}\n", extra.join("  ").dimmed()));
        }
        text
    }

    pub fn format_agent_output(output: &RunAgentOutput) -> String {
        let mut text = String::new();
        text.push_str(&Self::header("Answer"));
        text.push_str(output.response.trim());
        text.push('\n');

        let failed = output
            .tool_results
            .iter()
            .filter(|r| !r.output.success)
            .count();
        text.push_str(&format!(
            "\n{}\n",
            format!(
                "{} turn(s), {} tool call(s), {} failed, provider: {}",
                output.turns,
                output.tool_results.len(),
                failed,
                output.provider
            )
            .dimmed()
        ));
        text
    }

    pub fn format_stats(registry: &RegistryStats, orchestrator: &OrchestratorStats) -> String {
        let mut text = Self::header("Statistics");
        text.push_str(&format!(
            "  registry:     {} calls, {} ok, {} failed, cache {}/{} hit, {} cached\n",
            registry.total_calls,
            registry.successes,
            registry.failures,
            registry.cache_hits,
            registry.cache_hits + registry.cache_misses,
            registry.cache_size
        ));
        let rate = orchestrator
            .success_rate
            .map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        text.push_str(&format!(
            "  orchestrator: {} runs, {} success rate, avg {:.0}ms, {} session grant(s)\n",
            orchestrator.total_executions,
            rate,
            orchestrator.avg_duration_ms,
            orchestrator.session_grants
        ));
        text
    }

    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut text = String::new();
        for issue in issues {
            let label = match issue.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            text.push_str(&format!("{}: {}\n", label, issue.message));
        }
        text
    }

    fn header(title: &str) -> String {
        format!("\n{}\n", format!("── {} ──", title).cyan().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::{ConfigIssueCode, ToolError, ToolKind};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_tools_lists_flags() {
        plain();
        let specs = vec![
            ToolSpec::new("echo", "Echo a message"),
            ToolSpec::new("shell", "Run a command")
                .with_kind(ToolKind::Shell)
                .with_mutating(true)
                .with_requires_approval(true),
        ];
        let text = ConsoleFormatter::format_tools(&specs);
        assert!(text.contains("Tools (2)"));
        assert!(text.contains("echo"));
        assert!(text.contains("ma-"));
        assert!(text.contains("shell"));
    }

    #[test]
    fn test_format_output_success_and_failure() {
        plain();
        let ok = ToolOutput::success(json!({"a": 1})).with_metadata("exit_code", 0);
        let text = ConsoleFormatter::format_output("calc", &ok);
        assert!(text.starts_with("✓ calc"));
        assert!(text.contains("\"a\": 1"));
        assert!(text.contains("exit_code=0"));

        let failed = ToolOutput::failure(ToolError::rejected("User denied"));
        let text = ConsoleFormatter::format_output("shell", &failed);
        assert!(text.contains("[REJECTED]"));
        assert!(text.contains("User denied"));
        assert!(!text.contains("code="));
    }

    #[test]
    fn test_format_ranked_empty() {
        plain();
        let text = ConsoleFormatter::format_ranked("zzz", &[]);
        assert!(text.contains("No matching tools"));
    }

    #[test]
    fn test_format_issues() {
        plain();
        let issues = vec![ConfigIssue::warning(
            ConfigIssueCode::MissingValue {
                field: "backend.model".into(),
            },
            "backend.model is empty",
        )];
        assert_eq!(
            ConsoleFormatter::format_issues(&issues),
            "warning: backend.model is empty\n"
        );
    }
}
