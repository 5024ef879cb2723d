//! Repository implementations
//!
//! This module contains concrete implementations of all repository traits
//! defined in chibi-core, using sqlx for PostgreSQL access.

pub mod call_repo;
pub mod cdr_repo;
pub mod message_repo;
pub mod user_repo;

pub use call_repo::PgPhoneCallRepository;
pub use cdr_repo::PgCdrRepository;
pub use message_repo::PgMessageRepository;
pub use user_repo::PgUserRepository;
