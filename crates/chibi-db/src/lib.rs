//! Chibi Database Layer
//!
//! This crate provides PostgreSQL database access and repository
//! implementations for the Chibi backend. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for all domain entities
//! - Unique-constraint conflict mapping for webhook replays

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use chibi_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
