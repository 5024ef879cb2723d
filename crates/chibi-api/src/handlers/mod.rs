//! HTTP request handlers

pub mod admin;
pub mod calls;
pub mod cdr;
pub mod chats;
pub mod health;
pub mod messages;
pub mod receipts;
pub mod stats;

pub use admin::configure as configure_admin;
pub use calls::configure as configure_calls;
pub use cdr::configure as configure_cdrs;
pub use chats::configure as configure_chats;
pub use chats::configure_users;
pub use health::configure as configure_health;
pub use messages::configure as configure_messages;
pub use receipts::configure as configure_receipts;
pub use stats::configure as configure_stats;
