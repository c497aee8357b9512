//! JSONL file writer for execution records.
//!
//! Each [`ExecutionRecord`] is serialized as a single JSON line with a
//! `type` field and an RFC3339 `time`, appended to the file via a buffered
//! writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use toolgate_application::ExecutionLogger;
use toolgate_domain::ExecutionRecord;
use tracing::warn;

const RECORD_TYPE: &str = "tool_execution";

/// JSONL execution logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file.
/// Flushes on `Drop`.
pub struct JsonlExecutionLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlExecutionLogger {
    /// Create a new logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create execution log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open execution log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_line(record: &ExecutionRecord) -> Option<String> {
    let serde_json::Value::Object(mut map) = serde_json::to_value(record).ok()? else {
        return None;
    };

    let time = chrono::DateTime::from_timestamp_millis(record.timestamp as i64)
        .unwrap_or_else(chrono::Utc::now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    map.insert("type".to_string(), serde_json::Value::from(RECORD_TYPE));
    map.insert("time".to_string(), serde_json::Value::String(time));
    serde_json::to_string(&map).ok()
}

impl ExecutionLogger for JsonlExecutionLogger {
    fn log(&self, record: &ExecutionRecord) {
        let Some(line) = to_line(record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each record for crash safety
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlExecutionLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
