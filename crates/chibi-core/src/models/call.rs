//! Phone call model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phone call status values
pub mod status {
    /// Call set up, not yet finished
    pub const INITIATED: &str = "initiated";
    /// Call finished normally
    pub const COMPLETED: &str = "completed";
    /// Callee never picked up
    pub const MISSED: &str = "missed";
}

/// A logical phone call between two users
///
/// CDR legs reference their owning call via `phone_call_id`; the call row is
/// created from the carrier's webhook before any CDR leg arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneCall {
    /// Unique identifier
    pub id: i64,

    /// Carrier call identifier
    pub call_uuid: String,

    /// Caller number
    pub from_number: String,

    /// Callee number
    pub to_number: String,

    /// Call status (see [`status`])
    pub status: String,

    /// Owning user, when the caller is known
    pub user_id: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PhoneCall {
    /// Check if the call was never answered
    #[inline]
    pub fn is_missed(&self) -> bool {
        self.status == status::MISSED
    }
}

impl Default for PhoneCall {
    fn default() -> Self {
        Self {
            id: 0,
            call_uuid: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            status: status::INITIATED.to_string(),
            user_id: None,
            created_at: Utc::now(),
        }
    }
}
