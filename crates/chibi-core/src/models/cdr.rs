//! CDR (Call Data Record) model
//!
//! Represents one leg of a phone call between two users. Outbound legs are
//! bridged to their causally-prior inbound leg via `bridge_uuid`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CDR (Call Data Record)
///
/// One persisted leg of a phone call. Created as an empty shell when the
/// carrier notifies us of a call event, populated exactly once from the
/// carrier's call record, and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cdr {
    /// Unique identifier
    pub id: i64,

    /// Call leg unique identifier (from the carrier)
    pub uuid: String,

    /// Call direction (inbound/outbound)
    pub direction: String,

    /// Call start timestamp
    pub start_time: DateTime<Utc>,

    /// Total call duration in seconds
    pub duration: i32,

    /// Billable duration in seconds
    pub billsec: i32,

    /// Callee-facing number for this leg
    pub from_number: String,

    /// Terminating number
    pub to_number: String,

    /// Identifier of the inbound leg of the same logical call
    pub bridge_uuid: Option<String>,

    /// Linked inbound-leg CDR id (self-referential)
    pub inbound_cdr_id: Option<i64>,

    /// Owning phone call (inbound legs only)
    pub phone_call_id: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Cdr {
    /// Create an unpopulated shell for a carrier call identifier
    pub fn shell(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Default::default()
        }
    }

    /// Check if this is an inbound leg
    #[inline]
    pub fn is_inbound(&self) -> bool {
        self.direction == "inbound"
    }

    /// Check if this is an outbound leg
    #[inline]
    pub fn is_outbound(&self) -> bool {
        self.direction == "outbound"
    }

    /// Check if this leg has been linked to its inbound counterpart
    #[inline]
    pub fn is_bridged(&self) -> bool {
        self.inbound_cdr_id.is_some()
    }
}

impl Default for Cdr {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            uuid: String::new(),
            direction: String::new(),
            start_time: now,
            duration: 0,
            billsec: 0,
            from_number: String::new(),
            to_number: String::new(),
            bridge_uuid: None,
            inbound_cdr_id: None,
            phone_call_id: None,
            created_at: now,
        }
    }
}

/// Call record as reported by the carrier API
///
/// Field mapping onto [`Cdr`] happens in the reconciliation service; this
/// struct carries the carrier's view of a single call leg.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierCall {
    /// Call leg identifier
    pub uuid: String,

    /// Raw carrier direction string (e.g. "inbound", "outbound-dial")
    pub direction: String,

    /// Call start timestamp
    pub start_time: DateTime<Utc>,

    /// Reported duration in seconds
    pub duration: i32,

    /// Originating number
    pub from: String,

    /// Terminating number
    pub to: String,

    /// Parent call identifier (the bridged inbound leg)
    pub parent_call_uuid: Option<String>,
}
