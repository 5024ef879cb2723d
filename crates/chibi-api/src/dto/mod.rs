//! Data transfer objects for the HTTP API

pub mod admin;
pub mod call;
pub mod cdr;
pub mod chat;
pub mod common;
pub mod message;
pub mod stats;

pub use admin::{ReapResponse, WorkerStatusResponse};
pub use call::{MissedCallRequest, PhoneCallEventRequest, PhoneCallResponse};
pub use cdr::{CdrBatchResponse, CdrFilterParams, CdrResponse};
pub use chat::{ChatPairResponse, UserResponse};
pub use common::{ApiResponse, PaginationParams};
pub use message::{InboundMessageRequest, MessageResponse};
pub use stats::{DemographicsResponse, InteractionsResponse, OverviewResponse};
