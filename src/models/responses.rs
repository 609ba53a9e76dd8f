//! Response DTOs for the position API
//!
//! Positions are returned as-is; these cover the operational endpoints.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Hit rate of first lookups (hits / (hits + misses))
    pub hit_rate: f64,
    /// Backend in use: "redis" or "memory"
    pub backend: &'static str,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, backend: &'static str) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            backend,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
