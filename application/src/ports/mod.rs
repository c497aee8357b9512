//! Port definitions (interfaces) for the application layer
//!
//! Ports define the boundaries between the application and infrastructure
//! layers. Infrastructure adapters implement these traits.

pub mod agent_progress;
pub mod ai_backend;
pub mod approval_handler;
pub mod browser_driver;
pub mod execution_logger;
pub mod tool_handler;
pub mod tool_observer;
