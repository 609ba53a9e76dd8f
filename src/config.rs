//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheSettings, RateLimitRule};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment, first segment of every key
    pub environment: String,
    /// Redis connection URL; the in-process store is used when unset
    pub redis_url: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// In-process store cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Base TTL of cached positions in seconds
    pub position_ttl: u64,
    /// Maximum random seconds added to the position TTL
    pub position_ttl_jitter: u64,
    /// TTL of cached client position lists in seconds
    pub client_list_ttl: u64,
    /// Rebuild lock expiry in milliseconds
    pub rebuild_lock_ttl_ms: u64,
    /// Fixed rate-limit window in seconds
    pub rate_limit_window: u64,
    /// Requests allowed per client per window
    pub rate_limit_max: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - Key namespace environment (default: prod)
    /// - `REDIS_URL` - Redis URL (default: unset, in-process store)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `POSITION_TTL_SECS` - Position TTL (default: 30)
    /// - `POSITION_TTL_JITTER_SECS` - Position TTL jitter (default: 10)
    /// - `CLIENT_LIST_TTL_SECS` - Client list TTL (default: 20)
    /// - `REBUILD_LOCK_TTL_MS` - Rebuild lock TTL (default: 2000)
    /// - `RATE_LIMIT_WINDOW_SECS` - Rate-limit window (default: 10)
    /// - `RATE_LIMIT_MAX` - Requests per window (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env::var("APP_ENV")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.environment),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            position_ttl: env_or("POSITION_TTL_SECS", defaults.position_ttl),
            position_ttl_jitter: env_or("POSITION_TTL_JITTER_SECS", defaults.position_ttl_jitter),
            client_list_ttl: env_or("CLIENT_LIST_TTL_SECS", defaults.client_list_ttl),
            rebuild_lock_ttl_ms: env_or("REBUILD_LOCK_TTL_MS", defaults.rebuild_lock_ttl_ms),
            rate_limit_window: env_or("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window),
            rate_limit_max: env_or("RATE_LIMIT_MAX", defaults.rate_limit_max),
        }
    }

    /// Cache-aside settings; the wait schedule keeps its default table.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            position_ttl: Duration::from_secs(self.position_ttl.max(1)),
            position_ttl_jitter_secs: self.position_ttl_jitter,
            client_list_ttl: Duration::from_secs(self.client_list_ttl.max(1)),
            rebuild_lock_ttl: Duration::from_millis(self.rebuild_lock_ttl_ms.max(1)),
            ..CacheSettings::default()
        }
    }

    pub fn rate_limit_rule(&self) -> RateLimitRule {
        RateLimitRule {
            window_seconds: self.rate_limit_window.max(1),
            limit: self.rate_limit_max,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "prod".to_string(),
            redis_url: None,
            server_port: 3000,
            cleanup_interval: 1,
            position_ttl: 30,
            position_ttl_jitter: 10,
            client_list_ttl: 20,
            rebuild_lock_ttl_ms: 2000,
            rate_limit_window: 10,
            rate_limit_max: 5,
        }
    }
}
