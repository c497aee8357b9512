//! TTL cache of successful tool outputs.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use toolgate_domain::{Arguments, ToolOutput, canonical_json};

/// `tool_name:canonical_json(arguments)`
pub fn cache_key(tool_name: &str, arguments: &Arguments) -> String {
    format!(
        "{}:{}",
        tool_name,
        canonical_json(&Value::Object(arguments.clone()))
    )
}

struct CacheEntry {
    output: ToolOutput,
    stored_at: Instant,
}

pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Fresh entry for `key`; an expired entry is evicted on access.
    pub fn get(&mut self, key: &str) -> Option<ToolOutput> {
        let fresh = self
            .entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() < self.ttl)?;

        if fresh {
            self.entries.get(key).map(|entry| entry.output.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Store a successful output. Failures are ignored.
    pub fn insert(&mut self, key: String, output: ToolOutput) {
        if !output.success {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                output,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries, returning how many were removed
    pub fn prune(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::ToolError;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_ignores_argument_order() {
        let a = cache_key("t", &args(json!({"x": 1, "y": 2})));
        let b = cache_key("t", &args(json!({"y": 2, "x": 1})));
        assert_eq!(a, b);
        assert_ne!(a, cache_key("u", &args(json!({"x": 1, "y": 2}))));
    }

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = ResultCache::new(Duration::from_secs(60));
        cache.insert("k".into(), ToolOutput::success("v"));
        assert_eq!(cache.get("k").unwrap().content, json!("v"));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = ResultCache::new(Duration::from_secs(60));
        cache.insert("k".into(), ToolOutput::failure(ToolError::execution_failed("x")));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let mut cache = ResultCache::new(Duration::ZERO);
        cache.insert("k".into(), ToolOutput::success("v"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());

        cache.insert("a".into(), ToolOutput::success("v"));
        cache.insert("b".into(), ToolOutput::success("v"));
        assert_eq!(cache.prune(), 2);
    }
}
