//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Store cleanup: purges expired keys from the in-process store

mod cleanup;

pub use cleanup::spawn_cleanup_task;
