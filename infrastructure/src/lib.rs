//! Infrastructure layer for toolgate
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the concrete tool handlers, the OpenAI-compatible
//! backend, the JSONL execution logger, and configuration file loading.

pub mod config;
pub mod logging;
#[cfg(feature = "http-tools")]
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use logging::JsonlExecutionLogger;
#[cfg(feature = "http-tools")]
pub use providers::OpenAiBackend;
#[cfg(feature = "http-tools")]
pub use tools::RemoteToolHandler;
pub use tools::{
    BrowserActionHandler, FunctionHandler, ShellHandler, builtin_tools, configured_tools,
    register_configured_tools,
};
