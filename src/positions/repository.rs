//! Position Repository
//!
//! The source of truth the cache sits in front of. `PositionSource` is the
//! read interface the cache-aside loaders call; `PositionRepository` is the
//! in-process, tenant-partitioned implementation used by the server.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::TenantContext;
use crate::error::LoadError;
use crate::positions::Position;

/// Authoritative reads.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn load_by_id(&self, ctx: &TenantContext, id: Uuid) -> Result<Position, LoadError>;

    async fn load_by_client(
        &self,
        ctx: &TenantContext,
        client_id: &str,
    ) -> Result<Vec<Position>, LoadError>;
}

pub(crate) fn not_found(id: Uuid) -> LoadError {
    LoadError::NotFound(format!("Position not found: {}", id))
}

// == Position Repository ==
type TenantTable = HashMap<Uuid, Position>;

#[derive(Debug, Clone, Default)]
pub struct PositionRepository {
    tenants: Arc<RwLock<HashMap<String, TenantTable>>>,
}

impl PositionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, ctx: &TenantContext, position: Position) -> Position {
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(ctx.tenant().to_string())
            .or_default()
            .insert(position.id, position.clone());
        position
    }

    /// Applies `change` to the stored position and returns the new state.
    pub async fn update<F>(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        change: F,
    ) -> Result<Position, LoadError>
    where
        F: FnOnce(&mut Position) + Send,
    {
        let mut tenants = self.tenants.write().await;
        let position = tenants
            .get_mut(ctx.tenant())
            .and_then(|table| table.get_mut(&id))
            .ok_or_else(|| not_found(id))?;
        change(position);
        Ok(position.clone())
    }

    pub async fn remove(&self, ctx: &TenantContext, id: Uuid) -> Result<Position, LoadError> {
        let mut tenants = self.tenants.write().await;
        tenants
            .get_mut(ctx.tenant())
            .and_then(|table| table.remove(&id))
            .ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl PositionSource for PositionRepository {
    async fn load_by_id(&self, ctx: &TenantContext, id: Uuid) -> Result<Position, LoadError> {
        let tenants = self.tenants.read().await;
        tenants
            .get(ctx.tenant())
            .and_then(|table| table.get(&id))
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn load_by_client(
        &self,
        ctx: &TenantContext,
        client_id: &str,
    ) -> Result<Vec<Position>, LoadError> {
        let tenants = self.tenants.read().await;
        let mut positions: Vec<Position> = tenants
            .get(ctx.tenant())
            .map(|table| {
                table
                    .values()
                    .filter(|p| p.client_id == client_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.id.cmp(&b.id)));
        Ok(positions)
    }
}
