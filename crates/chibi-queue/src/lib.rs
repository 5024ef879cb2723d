//! Job-queue worker registry access for the Chibi backend
//!
//! The background-job runtime keeps its worker state in Redis. This crate
//! provides a read-mostly view of that state for the stale worker reaper:
//! a snapshot of registered workers and their current job claims, plus the
//! ability to force a claim release by deleting the claim key.
//!
//! # Features
//!
//! - Connection pooling via Redis ConnectionManager
//! - Claim payload decoding with serde_json; garbled payloads degrade to
//!   "no job" rather than failing the snapshot
//! - In-memory registry twin for tests
//!
//! # Example
//!
//! ```no_run
//! use chibi_queue::RedisWorkerRegistry;
//! use chibi_core::traits::WorkerRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = RedisWorkerRegistry::new("redis://127.0.0.1:6379").await?;
//!     let workers = registry.workers().await?;
//!     println!("{} workers registered", workers.len());
//!     Ok(())
//! }
//! ```

pub mod keys;

use async_trait::async_trait;
use chibi_core::error::AppError;
use chibi_core::models::{JobClaim, WorkerSnapshot};
use chibi_core::traits::WorkerRegistry;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::Deserialize;
use tracing::{debug, error, warn};

/// Redis-backed worker registry
///
/// Wraps a Redis ConnectionManager to provide efficient, multiplexed access
/// to the queue runtime's worker keys. All operations are async and return
/// Results with AppError.
#[derive(Clone)]
pub struct RedisWorkerRegistry {
    manager: ConnectionManager,
}

/// Claim payload as stored by the queue runtime
#[derive(Debug, Deserialize)]
struct ClaimPayload {
    run_at: DateTime<Utc>,
    #[serde(default)]
    payload: serde_json::Value,
}

impl RedisWorkerRegistry {
    /// Create a new registry instance
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns `AppError::QueueConnection` if the connection fails
    pub async fn new(url: &str) -> Result<Self, AppError> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::QueueConnection(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::QueueConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established successfully");
        Ok(Self { manager })
    }

    /// Ping the Redis server to check connectivity
    ///
    /// # Errors
    ///
    /// Returns `AppError::Queue` if the ping fails
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                AppError::Queue(format!("Ping failed: {}", e))
            })?;
        Ok(())
    }

    /// Convert RedisError to AppError
    fn map_redis_error(err: RedisError) -> AppError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                AppError::QueueConnection(format!("I/O error: {}", err))
            }
            _ => {
                warn!("Redis error: {}", err);
                AppError::Queue(err.to_string())
            }
        }
    }

    /// Decode a raw claim payload; garbled payloads degrade to None
    fn decode_claim(worker_id: &str, raw: &str) -> Option<JobClaim> {
        match serde_json::from_str::<ClaimPayload>(raw) {
            Ok(claim) => Some(JobClaim {
                run_at: claim.run_at,
                payload: claim.payload,
            }),
            Err(e) => {
                warn!(
                    "Undecodable claim payload for worker {}: {} (treating as no job)",
                    worker_id, e
                );
                None
            }
        }
    }
}

#[async_trait]
impl WorkerRegistry for RedisWorkerRegistry {
    async fn workers(&self) -> Result<Vec<WorkerSnapshot>, AppError> {
        let mut conn = self.manager.clone();

        let ids: Vec<String> = conn
            .smembers(keys::WORKERS_SET_KEY)
            .await
            .map_err(Self::map_redis_error)?;

        debug!("Snapshotting {} registered workers", ids.len());

        let mut snapshots = Vec::with_capacity(ids.len());
        for id in ids {
            let raw: Option<String> = conn
                .get(keys::worker_claim_key(&id))
                .await
                .map_err(Self::map_redis_error)?;

            // A worker with no claim key is idle. A claim key that fails to
            // decode leaves the worker busy but unclassifiable (job: None).
            let (idle, job) = match raw {
                Some(raw) => (false, Self::decode_claim(&id, &raw)),
                None => (true, None),
            };

            snapshots.push(WorkerSnapshot { id, idle, job });
        }

        Ok(snapshots)
    }

    async fn release_claim(&self, worker_id: &str) -> Result<(), AppError> {
        debug!("Releasing claim for worker {}", worker_id);

        let mut conn = self.manager.clone();
        let _: i64 = conn
            .del(keys::worker_claim_key(worker_id))
            .await
            .map_err(Self::map_redis_error)?;

        Ok(())
    }
}

/// In-memory worker registry for tests
///
/// Mirrors the semantics of [`RedisWorkerRegistry`] without a Redis server.
/// Released claims are recorded so tests can assert on reaper behavior.
#[derive(Default)]
pub struct InMemoryWorkerRegistry {
    workers: RwLock<Vec<WorkerSnapshot>>,
    released: RwLock<Vec<String>>,
}

impl InMemoryWorkerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker snapshot
    pub fn insert(&self, worker: WorkerSnapshot) {
        self.workers.write().push(worker);
    }

    /// Worker ids whose claims have been released
    pub fn released_ids(&self) -> Vec<String> {
        self.released.read().clone()
    }
}

#[async_trait]
impl WorkerRegistry for InMemoryWorkerRegistry {
    async fn workers(&self) -> Result<Vec<WorkerSnapshot>, AppError> {
        Ok(self.workers.read().clone())
    }

    async fn release_claim(&self, worker_id: &str) -> Result<(), AppError> {
        let mut workers = self.workers.write();
        let worker = workers
            .iter_mut()
            .find(|w| w.id == worker_id)
            .ok_or_else(|| AppError::NotFound(format!("Worker {} not registered", worker_id)))?;

        worker.job = None;
        worker.idle = true;
        self.released.write().push(worker_id.to_string());
        Ok(())
    }
}
