//! Core helpers shared across all subdomains.
//!
//! - [`clock::now_millis`]: epoch timestamps
//! - [`json::canonical_json`]: key-order independent JSON encoding
//! - [`string::truncate`]: UTF-8 safe truncation
//! - [`config_issue::ConfigIssue`]: config validation findings

pub mod clock;
pub mod config_issue;
pub mod json;
pub mod string;
