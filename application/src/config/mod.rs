//! Application-level configuration.
//!
//! This module provides configuration types that control how the runtime behaves:
//!
//! - [`RegistryParams`]: catalog, cache, history, and batch parallelism
//! - [`OrchestratorParams`]: approval gate and retry policy
//! - [`AgentParams`]: agent loop control (turns, tokens, prompt)

pub mod agent_params;
pub mod orchestrator_params;
pub mod registry_params;

pub use agent_params::AgentParams;
pub use orchestrator_params::OrchestratorParams;
pub use registry_params::RegistryParams;
