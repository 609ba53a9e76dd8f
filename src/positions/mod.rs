//! Positions Module
//!
//! The position record, its source of truth and the service combining both
//! with the cache.

mod model;
mod repository;
mod service;

pub use model::Position;
pub use repository::{PositionRepository, PositionSource};
pub use service::PositionService;
