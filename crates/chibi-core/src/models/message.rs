//! SMS message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message delivery status values
pub mod status {
    /// Inbound message accepted from the carrier
    pub const RECEIVED: &str = "received";
    /// Outbound message handed to the carrier
    pub const SENT: &str = "sent";
    /// Carrier confirmed delivery
    pub const DELIVERED: &str = "delivered";
    /// Carrier reported a delivery failure
    pub const FAILED: &str = "failed";
}

/// A persisted SMS message, inbound or outbound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: i64,

    /// Carrier message identifier
    pub sid: String,

    /// Sender number
    pub from_number: String,

    /// Recipient number
    pub to_number: String,

    /// Message body
    pub body: String,

    /// Delivery status (see [`status`])
    pub status: String,

    /// Owning user, when the sender is known
    pub user_id: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: 0,
            sid: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            body: String::new(),
            status: status::RECEIVED.to_string(),
            user_id: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_received() {
        let msg = Message::default();
        assert_eq!(msg.status, status::RECEIVED);
    }
}
