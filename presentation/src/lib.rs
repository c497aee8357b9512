//! Presentation layer for toolgate
//!
//! This crate contains CLI definitions, the interactive approval prompt,
//! output formatters, and progress reporters.

pub mod approval;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use approval::interactive::InteractiveApprovalHandler;
pub use cli::commands::{Cli, Command};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{AgentProgressReporter, ConsoleToolObserver};
