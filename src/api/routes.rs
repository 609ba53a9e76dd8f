//! API Routes
//!
//! Configures the Axum router with all position service endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_position_handler, delete_position_handler, get_position_handler, health_handler,
    list_client_positions_handler, stats_handler, update_position_handler, AppState,
};
use super::middleware::rate_limit_get_position;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /positions` - Create a position
/// - `GET /positions/:id` - Read a position (rate limited)
/// - `PUT /positions/:id` - Update a position
/// - `DELETE /positions/:id` - Delete a position
/// - `GET /clients/:client_id/positions` - List a client's positions
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The limiter only wraps the GET handler registered before it
    let position_routes = get(get_position_handler)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_get_position,
        ))
        .put(update_position_handler)
        .delete(delete_position_handler);

    Router::new()
        .route("/positions", post(create_position_handler))
        .route("/positions/:id", position_routes)
        .route("/clients/:client_id/positions", get(list_client_positions_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
