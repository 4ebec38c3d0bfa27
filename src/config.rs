//! Engine configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::eviction::EvictionPolicy;

// Default values for the cache configuration
const DEFAULT_RECORD_LIMIT: usize = 0; // unbounded
const DEFAULT_CHANGE_LOG_LIMIT: usize = 1024;
const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 10_000;

/// Cache engine configuration.
///
/// Host applications typically embed this in their own configuration file;
/// every field has a default, so partial tables deserialize cleanly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum records kept in the store. Zero means unbounded: no eviction.
    pub record_limit: usize,
    /// Maximum retained change events before the oldest are dropped.
    pub change_log_limit: usize,
    /// Client-side bound on one network call, in milliseconds. Zero disables
    /// the wrapper and defers entirely to the transport.
    pub network_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            record_limit: DEFAULT_RECORD_LIMIT,
            change_log_limit: DEFAULT_CHANGE_LOG_LIMIT,
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
        }
    }
}

impl CacheConfig {
    /// Eviction policy implied by `record_limit`.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        match NonZeroUsize::new(self.record_limit) {
            Some(max_records) => EvictionPolicy::Lru { max_records },
            None => EvictionPolicy::NoEviction,
        }
    }

    /// Network timeout, if enabled.
    pub fn network_timeout(&self) -> Option<Duration> {
        (self.network_timeout_ms > 0).then(|| Duration::from_millis(self.network_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.record_limit, 0);
        assert_eq!(config.change_log_limit, 1024);
        assert_eq!(config.network_timeout_ms, 10_000);
    }

    #[test]
    fn zero_record_limit_means_no_eviction() {
        let config = CacheConfig::default();
        assert_eq!(config.eviction_policy(), EvictionPolicy::NoEviction);
    }

    #[test]
    fn positive_record_limit_selects_lru() {
        let config = CacheConfig {
            record_limit: 500,
            ..Default::default()
        };
        assert_eq!(config.eviction_policy(), EvictionPolicy::lru(500));
    }

    #[test]
    fn zero_timeout_disables_the_wrapper() {
        let config = CacheConfig {
            network_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.network_timeout(), None);
    }

    #[test]
    fn partial_tables_deserialize_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"record_limit": 8}"#).expect("partial config");
        assert_eq!(config.record_limit, 8);
        assert_eq!(config.change_log_limit, 1024);
        assert_eq!(config.network_timeout_ms, 10_000);
    }
}
