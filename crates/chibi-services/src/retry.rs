//! Bounded retry for write-conflict errors
//!
//! Concurrent webhook deliveries race on find-or-create writes; the loser
//! hits a unique-constraint conflict and simply needs to run again. This
//! helper retries exactly that error class with exponential backoff, and
//! nothing else.

use chibi_core::error::AppError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry schedule for conflict-class failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Cap on the exponential backoff
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Backoff before retry number `attempt` (1-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of an exhausted or aborted retry loop
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt conflicted; carries the final conflict error
    Exhausted { attempts: u32, last: AppError },

    /// A non-conflict error aborted the loop immediately
    Fatal(AppError),
}

impl RetryError {
    /// Collapse back into the underlying application error
    pub fn into_app_error(self) -> AppError {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Fatal(err) => err,
        }
    }
}

impl From<RetryError> for AppError {
    fn from(err: RetryError) -> Self {
        err.into_app_error()
    }
}

/// Run `op` until it succeeds, retrying only conflict-class errors
///
/// Conflicts (`AppError::Conflict`, `AppError::AlreadyExists`) are retried
/// up to `policy.max_attempts` total attempts with exponential backoff.
/// Any other error is returned as `RetryError::Fatal` without retrying.
pub async fn retry_on_conflict<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() => {
                if attempt >= policy.max_attempts {
                    warn!("Giving up after {} conflicting attempts: {}", attempt, err);
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    "Attempt {} conflicted ({}), retrying in {:?}",
                    attempt, err, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(RetryError::Fatal(err)),
        }
    }
}
