//! Position Service
//!
//! Reads go through the cache-aside orchestrator; writes go to the repository
//! first and then invalidate the affected cache keys.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use rust_decimal::Decimal;

use crate::cache::codec::normalize_amount;
use crate::cache::{CacheAside, CacheKeys, CacheSlot, CacheStats};
use crate::context::TenantContext;
use crate::error::LoadError;
use crate::models::{CreatePositionRequest, UpdatePositionRequest};
use crate::positions::{Position, PositionRepository, PositionSource};

#[derive(Clone)]
pub struct PositionService {
    repo: PositionRepository,
    source: Arc<dyn PositionSource>,
    cache: CacheAside,
    keys: CacheKeys,
}

impl PositionService {
    pub fn new(repo: PositionRepository, cache: CacheAside, keys: CacheKeys) -> Self {
        Self {
            source: Arc::new(repo.clone()),
            repo,
            cache,
            keys,
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn position_slot(&self, ctx: &TenantContext, id: Uuid) -> CacheSlot {
        let id = id.to_string();
        CacheSlot::new(
            self.keys.position(ctx, &id),
            self.keys.position_lock(ctx, &id),
        )
    }

    fn client_slot(&self, ctx: &TenantContext, client_id: &str) -> CacheSlot {
        CacheSlot::new(
            self.keys.client_positions(ctx, client_id),
            self.keys.client_positions_lock(ctx, client_id),
        )
    }

    // == Reads ==
    pub async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> Result<Position, LoadError> {
        let slot = self.position_slot(ctx, id);
        self.cache
            .get_single(&slot, || self.source.load_by_id(ctx, id))
            .await
    }

    pub async fn list_by_client(
        &self,
        ctx: &TenantContext,
        client_id: &str,
    ) -> Result<Vec<Position>, LoadError> {
        let client_id = client_id.trim();
        let slot = self.client_slot(ctx, client_id);
        self.cache
            .get_group(&slot, || self.source.load_by_client(ctx, client_id))
            .await
    }

    // == Writes ==
    pub async fn create(&self, ctx: &TenantContext, req: CreatePositionRequest) -> Position {
        let position = Position::new(
            req.client_id.trim(),
            req.symbol.trim(),
            req.quantity,
            stored_amount(req.avg_price),
        );
        let saved = self.repo.insert(ctx, position).await;

        self.cache
            .invalidate(&[self.keys.client_positions(ctx, &saved.client_id)])
            .await;
        info!(tenant = ctx.tenant(), id = %saved.id, "Position created");
        saved
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        req: UpdatePositionRequest,
    ) -> Result<Position, LoadError> {
        let updated = self
            .repo
            .update(ctx, id, |p| {
                p.symbol = req.symbol.trim().to_string();
                p.quantity = req.quantity;
                p.avg_price = stored_amount(req.avg_price);
                p.updated_at = Utc::now();
            })
            .await?;

        self.invalidate_position(ctx, &updated).await;
        info!(tenant = ctx.tenant(), id = %id, "Position updated");
        Ok(updated)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<(), LoadError> {
        let removed = self.repo.remove(ctx, id).await?;

        self.invalidate_position(ctx, &removed).await;
        info!(tenant = ctx.tenant(), id = %id, "Position deleted");
        Ok(())
    }

    /// Drops the singleton key and the owning client's list key together.
    async fn invalidate_position(&self, ctx: &TenantContext, position: &Position) {
        let id = position.id.to_string();
        self.cache
            .invalidate(&[
                self.keys.position(ctx, &id),
                self.keys.client_positions(ctx, &position.client_id),
            ])
            .await;
    }
}

/// Keeps the source of truth at the cached precision so hits and misses agree.
/// Out-of-range amounts are rejected by request validation.
fn stored_amount(amount: Decimal) -> Decimal {
    normalize_amount(amount).unwrap_or(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheSettings, KvStore, MemoryStore};

    fn service_with_store() -> (PositionService, MemoryStore) {
        let store = MemoryStore::new();
        let cache = CacheAside::new(Arc::new(store.clone()), CacheSettings::default());
        let service = PositionService::new(PositionRepository::new(), cache, CacheKeys::new("prod"));
        (service, store)
    }

    fn create_request(client: &str, symbol: &str) -> CreatePositionRequest {
        CreatePositionRequest {
            client_id: client.to_string(),
            symbol: symbol.to_string(),
            quantity: 10,
            avg_price: Decimal::new(12345, 3),
        }
    }

    #[tokio::test]
    async fn test_get_populates_cache() {
        let (service, store) = service_with_store();
        let ctx = TenantContext::default();
        let created = service.create(&ctx, create_request("c1", "AAPL")).await;

        let fetched = service.get_by_id(&ctx, created.id).await.unwrap();
        assert_eq!(fetched, created);

        let key = service.keys().position(&ctx, &created.id.to_string());
        assert!(store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_miss_and_hit_return_same_amount() {
        let (service, _) = service_with_store();
        let ctx = TenantContext::default();
        let mut req = create_request("c1", "AAPL");
        req.avg_price = Decimal::new(100005, 5);

        let created = service.create(&ctx, req).await;
        assert_eq!(created.avg_price.to_string(), "1.0001");

        let miss = service.get_by_id(&ctx, created.id).await.unwrap();
        let hit = service.get_by_id(&ctx, created.id).await.unwrap();
        assert_eq!(miss.avg_price.to_string(), hit.avg_price.to_string());
        assert_eq!(hit, created);
        assert_eq!(service.cache_stats().hits, 1);

        let update = UpdatePositionRequest {
            symbol: "AAPL".to_string(),
            quantity: 1,
            avg_price: Decimal::new(2_000_049, 6),
        };
        let updated = service.update(&ctx, created.id, update).await.unwrap();
        assert_eq!(updated.avg_price.to_string(), "2.0000");
        let reread = service.get_by_id(&ctx, created.id).await.unwrap();
        assert_eq!(reread.avg_price.to_string(), "2.0000");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (service, _) = service_with_store();
        let result = service.get_by_id(&TenantContext::default(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_invalidates_single_and_group() {
        let (service, store) = service_with_store();
        let ctx = TenantContext::new(Some("acme"));
        let created = service.create(&ctx, create_request("c1", "AAPL")).await;

        service.get_by_id(&ctx, created.id).await.unwrap();
        service.list_by_client(&ctx, "c1").await.unwrap();

        let single_key = service.keys().position(&ctx, &created.id.to_string());
        let group_key = service.keys().client_positions(&ctx, "c1");
        assert!(store.get(&single_key).await.unwrap().is_some());
        assert!(store.get(&group_key).await.unwrap().is_some());

        let req = UpdatePositionRequest {
            symbol: "AAPL".to_string(),
            quantity: 99,
            avg_price: Decimal::ONE,
        };
        service.update(&ctx, created.id, req).await.unwrap();

        assert!(store.get(&single_key).await.unwrap().is_none());
        assert!(store.get(&group_key).await.unwrap().is_none());
        assert_eq!(service.get_by_id(&ctx, created.id).await.unwrap().quantity, 99);
    }

    #[tokio::test]
    async fn test_create_invalidates_client_list() {
        let (service, _) = service_with_store();
        let ctx = TenantContext::default();

        assert!(service.list_by_client(&ctx, "c1").await.unwrap().is_empty());
        service.create(&ctx, create_request(" c1 ", "MSFT")).await;

        let list = service.list_by_client(&ctx, "c1 ").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].client_id, "c1");
    }

    #[tokio::test]
    async fn test_delete_then_read_is_not_found() {
        let (service, _) = service_with_store();
        let ctx = TenantContext::default();
        let created = service.create(&ctx, create_request("c1", "AAPL")).await;
        service.get_by_id(&ctx, created.id).await.unwrap();

        service.delete(&ctx, created.id).await.unwrap();

        assert!(service.get_by_id(&ctx, created.id).await.is_err());
        assert!(service.list_by_client(&ctx, "c1").await.unwrap().is_empty());
        assert!(matches!(
            service.delete(&ctx, created.id).await,
            Err(LoadError::NotFound(_))
        ));
    }
}
