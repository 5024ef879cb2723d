//! Common traits for repositories and external services
//!
//! Defines abstractions for database access, the carrier API, and the
//! job-queue worker registry.

use crate::error::AppError;
use crate::models::{CarrierCall, Cdr, Message, PhoneCall, User, WorkerSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// CDR repository trait with specialized methods
#[async_trait]
pub trait CdrRepository: Repository<Cdr, i64> {
    /// Find CDR by carrier call leg UUID
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Cdr>, AppError>;

    /// Find an inbound-direction CDR by UUID (bridge resolution)
    async fn find_inbound_by_uuid(&self, uuid: &str) -> Result<Option<Cdr>, AppError>;

    /// List CDRs with filtering
    async fn list_filtered(
        &self,
        direction: Option<&str>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Cdr>, i64), AppError>;
}

/// Message repository trait with specialized methods
#[async_trait]
pub trait MessageRepository: Repository<Message, i64> {
    /// Find message by carrier message sid
    async fn find_by_sid(&self, sid: &str) -> Result<Option<Message>, AppError>;

    /// Update message delivery status by sid, returning the updated row
    async fn update_status(&self, sid: &str, status: &str) -> Result<Option<Message>, AppError>;
}

/// Phone call repository trait with specialized methods
#[async_trait]
pub trait PhoneCallRepository: Repository<PhoneCall, i64> {
    /// Find phone call by carrier call UUID
    async fn find_by_call_uuid(&self, call_uuid: &str) -> Result<Option<PhoneCall>, AppError>;
}

/// User repository trait with specialized methods
#[async_trait]
pub trait UserRepository: Repository<User, i64> {
    /// Find user by phone number
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError>;
}

/// Carrier call-record lookup
///
/// One lookup per invocation, no retries; the caller decides how to handle
/// failures.
#[async_trait]
pub trait CallLookup: Send + Sync {
    /// Fetch the carrier's record for a call leg identifier
    async fn fetch_call(&self, uuid: &str) -> Result<CarrierCall, AppError>;
}

#[async_trait]
impl<T: CallLookup + ?Sized> CallLookup for Arc<T> {
    async fn fetch_call(&self, uuid: &str) -> Result<CarrierCall, AppError> {
        (**self).fetch_call(uuid).await
    }
}

/// Job-queue worker registry access
///
/// The registry belongs to the queue runtime; this trait exposes a
/// point-in-time snapshot of registered workers plus forced claim release.
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    /// Snapshot all registered workers
    async fn workers(&self) -> Result<Vec<WorkerSnapshot>, AppError>;

    /// Force a worker to release its current job claim without completing it
    async fn release_claim(&self, worker_id: &str) -> Result<(), AppError>;
}

#[async_trait]
impl<T: WorkerRegistry + ?Sized> WorkerRegistry for Arc<T> {
    async fn workers(&self) -> Result<Vec<WorkerSnapshot>, AppError> {
        (**self).workers().await
    }

    async fn release_claim(&self, worker_id: &str) -> Result<(), AppError> {
        (**self).release_claim(worker_id).await
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
