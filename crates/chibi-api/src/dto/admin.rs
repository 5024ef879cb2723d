//! Admin queue dashboard DTOs

use chibi_core::models::WorkerSnapshot;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Worker snapshot with stale classification applied
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatusResponse {
    pub id: String,
    pub idle: bool,
    pub job_run_at: Option<DateTime<Utc>>,
    pub job_payload: Option<serde_json::Value>,
    pub stale: bool,
}

impl WorkerStatusResponse {
    /// Classify a snapshot against `now` and the staleness threshold
    pub fn from_snapshot(worker: WorkerSnapshot, now: DateTime<Utc>, threshold: Duration) -> Self {
        let stale = worker.is_stale(now, threshold);
        Self {
            id: worker.id,
            idle: worker.idle,
            job_run_at: worker.job.as_ref().map(|job| job.run_at),
            job_payload: worker.job.map(|job| job.payload),
            stale,
        }
    }
}

/// Result of a manually triggered reap pass
#[derive(Debug, Clone, Serialize)]
pub struct ReapResponse {
    /// Number of claims released
    pub released: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chibi_core::models::JobClaim;
    use serde_json::json;

    #[test]
    fn test_stale_classification_carries_over() {
        let worker = WorkerSnapshot {
            id: "host:1:default".to_string(),
            idle: false,
            job: Some(JobClaim {
                run_at: Utc::now() - Duration::minutes(30),
                payload: json!({"class": "CleanupJob"}),
            }),
        };

        let status =
            WorkerStatusResponse::from_snapshot(worker, Utc::now(), Duration::minutes(10));
        assert!(status.stale);
        assert!(status.job_run_at.is_some());
    }
}
