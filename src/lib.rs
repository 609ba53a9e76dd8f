//! Portfolio Cache - a read-mostly position service
//!
//! Serves client positions through a cache-aside layer over a key-value
//! store, with a single-flight rebuild lock, TTL jitter and a fixed-window
//! rate limiter on single-position reads.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod positions;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use context::{ClientIdentity, TenantContext};
pub use tasks::spawn_cleanup_task;
