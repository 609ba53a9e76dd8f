//! Key Formatting
//!
//! Every key is a pure function of (environment, tenant, kind, identifier), so
//! all service instances agree on where a value, lock or counter lives.

use crate::context::TenantContext;

/// Builds namespaced keys for one deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    env: String,
}

impl CacheKeys {
    pub fn new(env: impl Into<String>) -> Self {
        Self { env: env.into() }
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    fn prefix(&self, ctx: &TenantContext) -> String {
        format!("{}:{}", self.env, ctx.tenant())
    }

    /// `{env}:{tenant}:cache:position:{id}`
    pub fn position(&self, ctx: &TenantContext, id: &str) -> String {
        format!("{}:cache:position:{}", self.prefix(ctx), id)
    }

    /// `{env}:{tenant}:cache:client:{clientId}:positions`
    pub fn client_positions(&self, ctx: &TenantContext, client_id: &str) -> String {
        format!("{}:cache:client:{}:positions", self.prefix(ctx), client_id)
    }

    /// `{env}:{tenant}:lock:cache:position:{id}`
    pub fn position_lock(&self, ctx: &TenantContext, id: &str) -> String {
        format!("{}:lock:cache:position:{}", self.prefix(ctx), id)
    }

    /// `{env}:{tenant}:lock:cache:positionsByClient:{clientId}`
    pub fn client_positions_lock(&self, ctx: &TenantContext, client_id: &str) -> String {
        format!(
            "{}:lock:cache:positionsByClient:{}",
            self.prefix(ctx),
            client_id
        )
    }

    /// `{env}:{tenant}:rl:{clientId}:{endpoint}:{windowStart}`
    pub fn rate_limit(
        &self,
        ctx: &TenantContext,
        client_id: &str,
        endpoint: &str,
        window_start: u64,
    ) -> String {
        format!(
            "{}:rl:{}:{}:{}",
            self.prefix(ctx),
            client_id,
            endpoint,
            window_start
        )
    }
}
