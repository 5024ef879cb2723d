//! Job-queue worker snapshot models
//!
//! Read-only view of the job-queue runtime's worker state, used by the
//! stale worker reaper. The queue runtime owns this data; we only inspect
//! it and force claim releases.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A job claim currently held by a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobClaim {
    /// When the job started running
    pub run_at: DateTime<Utc>,

    /// Opaque job payload as stored by the queue runtime
    pub payload: serde_json::Value,
}

/// Point-in-time snapshot of one registered worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Worker identity (host:pid:queues)
    pub id: String,

    /// Whether the worker reports itself idle
    pub idle: bool,

    /// Currently-claimed job, if any
    ///
    /// `None` also covers claims whose payload could not be decoded; an
    /// unclassifiable worker is never considered stale.
    pub job: Option<JobClaim>,
}

impl WorkerSnapshot {
    /// Classify this worker as stale relative to `now`
    ///
    /// A worker is stale iff it is not idle, holds a job, and the job has
    /// been running for longer than `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        if self.idle {
            return false;
        }

        match &self.job {
            Some(job) => job.run_at < now - threshold,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn worker(idle: bool, run_at_minutes_ago: Option<i64>) -> WorkerSnapshot {
        WorkerSnapshot {
            id: "host:1234:default".to_string(),
            idle,
            job: run_at_minutes_ago.map(|mins| JobClaim {
                run_at: Utc::now() - Duration::minutes(mins),
                payload: json!({"class": "CleanupJob"}),
            }),
        }
    }

    #[test]
    fn test_idle_worker_never_stale() {
        let w = worker(true, Some(120));
        assert!(!w.is_stale(Utc::now(), Duration::minutes(10)));
    }

    #[test]
    fn test_worker_without_job_never_stale() {
        let w = worker(false, None);
        assert!(!w.is_stale(Utc::now(), Duration::minutes(10)));
    }

    #[test]
    fn test_staleness_boundary() {
        let threshold = Duration::minutes(10);

        let fresh = worker(false, Some(9));
        assert!(!fresh.is_stale(Utc::now(), threshold));

        let stale = worker(false, Some(11));
        assert!(stale.is_stale(Utc::now(), threshold));
    }
}
