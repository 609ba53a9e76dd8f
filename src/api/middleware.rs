//! Rate-Limit Middleware
//!
//! Gates single-position reads per tenant and client before the cache is
//! touched. Denials answer 429 with a JSON body.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::context::{ClientIdentity, TenantContext};
use crate::error::ServiceError;

/// Endpoint name used in rate-limit keys for GET /positions/:id.
pub const GET_POSITION_ENDPOINT: &str = "getPosition";

pub async fn rate_limit_get_position(
    State(state): State<AppState>,
    ctx: TenantContext,
    client: ClientIdentity,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let allowed = state
        .limiter
        .check(
            state.positions.keys(),
            &ctx,
            &client,
            GET_POSITION_ENDPOINT,
            state.rate_limit,
        )
        .await;

    if allowed {
        next.run(request).await
    } else {
        ServiceError::RateLimited.into_response()
    }
}
