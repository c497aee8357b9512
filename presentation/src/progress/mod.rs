//! Live progress for tool executions and agent turns

pub mod reporter;
