//! Structured configuration issues.
//!
//! Config validation never fails hard on a bad value: it falls back to a
//! default and reports a [`ConfigIssue`] so the binary can print it.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric value outside its accepted range
    OutOfRange { field: String },
    /// A string value that names no known option
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A value that must be present for the section to work
    MissingValue { field: String },
    /// Two configured tools share a name
    DuplicateTool { name: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }
}

/// Whether any issue is fatal
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_returns_true_for_errors() {
        let issues = vec![
            ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "registry.max_parallel".into(),
                },
                "zero",
            ),
            ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "remote_tools.endpoint".into(),
                },
                "missing",
            ),
        ];
        assert!(has_errors(&issues));
    }

    #[test]
    fn has_errors_returns_false_for_warnings_only() {
        let issues = vec![ConfigIssue::warning(
            ConfigIssueCode::DuplicateTool {
                name: "echo".into(),
            },
            "dup",
        )];
        assert!(!has_errors(&issues));
        assert!(!has_errors(&[]));
    }
}
