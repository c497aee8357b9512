//! Registry parameters: catalog, cache, and batch dispatch control.

use std::time::Duration;

/// Parameters for [`ToolRegistry`](crate::tooling::ToolRegistry).
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryParams {
    /// Capacity of the dispatch history ring buffer.
    pub max_history: usize,
    /// Whether successful non-mutating results are cached.
    pub enable_cache: bool,
    /// Lifetime of a cached result.
    pub cache_ttl: Duration,
    /// Maximum concurrent executions in a parallel batch.
    pub max_parallel: usize,
    /// Replace an existing tool on duplicate registration instead of failing.
    pub allow_overwrite: bool,
}

impl Default for RegistryParams {
    fn default() -> Self {
        Self {
            max_history: 1000,
            enable_cache: true,
            cache_ttl: Duration::from_secs(60),
            max_parallel: 10,
            allow_overwrite: false,
        }
    }
}

impl RegistryParams {
    // ==================== Builder Methods ====================

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max;
        self
    }

    pub fn with_allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RegistryParams::default();
        assert_eq!(params.max_history, 1000);
        assert!(params.enable_cache);
        assert_eq!(params.cache_ttl, Duration::from_secs(60));
        assert_eq!(params.max_parallel, 10);
        assert!(!params.allow_overwrite);
    }

    #[test]
    fn test_builder() {
        let params = RegistryParams::default()
            .with_cache(false)
            .with_max_parallel(2)
            .with_allow_overwrite(true);
        assert!(!params.enable_cache);
        assert_eq!(params.max_parallel, 2);
        assert!(params.allow_overwrite);
    }
}
