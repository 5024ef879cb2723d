//! API layer for the Chibi backend
//!
//! HTTP handlers for carrier webhooks (messages, phone calls, delivery
//! receipts, CDR batches), aggregate read views, and the basic-auth-protected
//! admin queue dashboard.

pub mod auth;
pub mod dto;
pub mod handlers;

// Re-export common DTOs
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{
    configure_admin, configure_calls, configure_cdrs, configure_chats, configure_health,
    configure_messages, configure_receipts, configure_stats, configure_users,
};
