//! Prompt domain
//!
//! Templates for the agent loop's system prompt and tool-result feedback.

pub mod agent;

pub use agent::AgentPromptTemplate;
