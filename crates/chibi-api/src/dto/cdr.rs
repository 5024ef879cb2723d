//! CDR DTOs

use chibi_core::models::Cdr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::PaginationParams;

/// CDR list filter parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CdrFilterParams {
    /// Pagination parameters
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,

    /// Filter by direction (`inbound` or `outbound`)
    pub direction: Option<String>,

    /// Filter by start time lower bound (RFC 3339)
    pub start_date: Option<DateTime<Utc>>,

    /// Filter by start time upper bound (RFC 3339)
    pub end_date: Option<DateTime<Utc>>,
}

/// CDR as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct CdrResponse {
    pub id: i64,
    pub uuid: String,
    pub direction: String,
    pub start_time: DateTime<Utc>,
    pub duration: i32,
    pub billsec: i32,
    pub from_number: String,
    pub to_number: String,
    pub bridge_uuid: Option<String>,
    pub inbound_cdr_id: Option<i64>,
    pub phone_call_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Cdr> for CdrResponse {
    fn from(cdr: Cdr) -> Self {
        Self {
            id: cdr.id,
            uuid: cdr.uuid,
            direction: cdr.direction,
            start_time: cdr.start_time,
            duration: cdr.duration,
            billsec: cdr.billsec,
            from_number: cdr.from_number,
            to_number: cdr.to_number,
            bridge_uuid: cdr.bridge_uuid,
            inbound_cdr_id: cdr.inbound_cdr_id,
            phone_call_id: cdr.phone_call_id,
            created_at: cdr.created_at,
        }
    }
}

/// Result of one CDR batch upload
#[derive(Debug, Clone, Serialize)]
pub struct CdrBatchResponse {
    /// Number of entries ingested
    pub ingested: usize,

    /// Created CDRs in document order
    pub cdrs: Vec<CdrResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdr_response_conversion() {
        let mut cdr = Cdr::default();
        cdr.id = 12;
        cdr.uuid = "CA1234".to_string();
        cdr.direction = "outbound".to_string();
        cdr.inbound_cdr_id = Some(7);

        let response = CdrResponse::from(cdr);
        assert_eq!(response.id, 12);
        assert_eq!(response.uuid, "CA1234");
        assert_eq!(response.inbound_cdr_id, Some(7));
    }
}
