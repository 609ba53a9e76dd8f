//! API Module
//!
//! HTTP handlers and routing for the position service REST API.
//!
//! # Endpoints
//! - `POST /positions` - Create a position
//! - `GET /positions/:id` - Read a position through the cache (rate limited)
//! - `PUT /positions/:id` - Update a position and invalidate its cache keys
//! - `DELETE /positions/:id` - Delete a position and invalidate its cache keys
//! - `GET /clients/:client_id/positions` - List a client's positions through the cache
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
