//! API Handlers
//!
//! HTTP request handlers for each position service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::cache::{CacheAside, CacheKeys, KvStore, RateLimitRule, RateLimiter};
use crate::config::Config;
use crate::context::TenantContext;
use crate::error::{Result, ServiceError};
use crate::models::{CreatePositionRequest, HealthResponse, StatsResponse, UpdatePositionRequest};
use crate::positions::{Position, PositionRepository, PositionService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub positions: PositionService,
    pub limiter: RateLimiter,
    pub rate_limit: RateLimitRule,
    /// Name of the key-value backend, reported by /stats
    pub backend: &'static str,
}

impl AppState {
    /// Wires the service, cache and limiter over one store.
    pub fn new(store: Arc<dyn KvStore>, config: &Config, backend: &'static str) -> Self {
        let cache = CacheAside::new(store.clone(), config.cache_settings());
        let keys = CacheKeys::new(config.environment.clone());
        Self {
            positions: PositionService::new(PositionRepository::new(), cache, keys),
            limiter: RateLimiter::new(store),
            rate_limit: config.rate_limit_rule(),
            backend,
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::InvalidRequest(format!("Invalid position id: {}", raw)))
}

/// Handler for POST /positions
pub async fn create_position_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<CreatePositionRequest>,
) -> Result<(StatusCode, Json<Position>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let created = state.positions.create(&ctx, req).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /positions/:id
pub async fn get_position_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Position>> {
    let id = parse_id(&id)?;
    let position = state.positions.get_by_id(&ctx, id).await?;
    Ok(Json(position))
}

/// Handler for GET /clients/:client_id/positions
pub async fn list_client_positions_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<Position>>> {
    if client_id.trim().is_empty() {
        return Err(ServiceError::InvalidRequest("clientId cannot be blank".to_string()));
    }
    let positions = state.positions.list_by_client(&ctx, &client_id).await?;
    Ok(Json(positions))
}

/// Handler for PUT /positions/:id
pub async fn update_position_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdatePositionRequest>,
) -> Result<Json<Position>> {
    let id = parse_id(&id)?;
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let updated = state.positions.update(&ctx, id, req).await?;
    Ok(Json(updated))
}

/// Handler for DELETE /positions/:id
pub async fn delete_position_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.positions.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.positions.cache_stats(),
        state.backend,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
