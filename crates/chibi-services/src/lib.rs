//! Business logic services for the Chibi backend
//!
//! This crate contains the services that orchestrate the domain operations:
//! CDR reconciliation against the carrier API, batch ingest of CDR payloads,
//! the stale job-queue worker reaper, bounded retry on write conflicts, and
//! the XML attachment store.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies via trait bounds, not concrete types
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `CdrReconciler` - One-shot carrier lookup and CDR field population
//! - `CdrIngestService` - XML batch parsing, archival, and per-entry populate
//! - `StaleWorkerReaper` - Periodic release of claims held by stuck workers
//! - `retry_on_conflict` - Bounded retry helper for write-conflict errors
//! - `XmlStore` - Filesystem store for uploaded CDR payloads

pub mod cdr;
pub mod reaper;
pub mod retry;
pub mod storage;

pub use cdr::{normalize_direction, CdrIngestService, CdrReconciler};
pub use reaper::StaleWorkerReaper;
pub use retry::{retry_on_conflict, RetryError, RetryPolicy};
pub use storage::XmlStore;
