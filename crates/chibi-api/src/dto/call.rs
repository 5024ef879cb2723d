//! Phone call DTOs

use chibi_core::models::PhoneCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Phone call event webhook payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhoneCallEventRequest {
    /// Carrier call identifier
    #[validate(length(min = 1, max = 64))]
    pub call_uuid: String,

    /// Caller number
    #[validate(length(min = 1, max = 32))]
    pub from: String,

    /// Callee number
    #[validate(length(min = 1, max = 32))]
    pub to: String,
}

/// Missed call webhook payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MissedCallRequest {
    /// Carrier call identifier
    #[validate(length(min = 1, max = 64))]
    pub call_uuid: String,

    /// Caller number
    #[validate(length(min = 1, max = 32))]
    pub from: String,

    /// Callee number
    #[validate(length(min = 1, max = 32))]
    pub to: String,
}

/// Phone call as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct PhoneCallResponse {
    pub id: i64,
    pub call_uuid: String,
    pub from_number: String,
    pub to_number: String,
    pub status: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<PhoneCall> for PhoneCallResponse {
    fn from(call: PhoneCall) -> Self {
        Self {
            id: call.id,
            call_uuid: call.call_uuid,
            from_number: call.from_number,
            to_number: call.to_number,
            status: call.status,
            user_id: call.user_id,
            created_at: call.created_at,
        }
    }
}
