//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment
//! variables.

use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL in milliseconds for entries without an explicit TTL
    pub default_ttl_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment
    /// variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 30000)
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
        }
    }

    /// The default TTL as a [`Duration`].
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl_ms, 30_000);
        assert_eq!(config.default_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("CACHE_DEFAULT_TTL_MS");

        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl_ms, 30_000);
    }
}
