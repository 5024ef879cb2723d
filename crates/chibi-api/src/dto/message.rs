//! Message DTOs

use chibi_core::models::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inbound SMS webhook payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InboundMessageRequest {
    /// Carrier message identifier
    #[validate(length(min = 1, max = 64))]
    pub sid: String,

    /// Sender number
    #[validate(length(min = 1, max = 32))]
    pub from: String,

    /// Recipient number
    #[validate(length(min = 1, max = 32))]
    pub to: String,

    /// Message body
    #[serde(default)]
    #[validate(length(max = 1600))]
    pub body: String,
}

/// Message as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub sid: String,
    pub from_number: String,
    pub to_number: String,
    pub body: String,
    pub status: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sid: message.sid,
            from_number: message.from_number,
            to_number: message.to_number,
            body: message.body,
            status: message.status,
            user_id: message.user_id,
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_payload_validation() {
        let request = InboundMessageRequest {
            sid: "SM123".to_string(),
            from: "+819011112222".to_string(),
            to: "+818033334444".to_string(),
            body: "hello".to_string(),
        };
        assert!(request.validate().is_ok());

        let request = InboundMessageRequest {
            sid: String::new(),
            from: "+819011112222".to_string(),
            to: "+818033334444".to_string(),
            body: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
