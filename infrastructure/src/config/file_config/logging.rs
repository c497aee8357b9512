//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration
///
/// ```toml
/// [logging]
/// level = "info"                            # overridden by -v and RUST_LOG
/// file = "~/.local/state/toolgate/toolgate.log"
/// execution_log = "executions.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Default filter directive when neither `-v` nor `RUST_LOG` is given
    pub level: Option<String>,
    /// Write diagnostic logs to this file instead of stderr
    pub file: Option<PathBuf>,
    /// Append every terminal invocation record as a JSON line
    pub execution_log: Option<PathBuf>,
}
