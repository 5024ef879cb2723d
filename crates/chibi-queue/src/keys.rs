//! Redis key constants and builders for the job-queue worker registry
//!
//! Mirrors the queue runtime's own key layout; this crate only reads those
//! keys and deletes claim entries, it never invents new ones.
//!
//! # Key Patterns
//!
//! - `queue:workers` - Set of registered worker ids
//! - `queue:worker:{worker_id}` - JSON claim payload for a busy worker
//!
//! # Example
//!
//! ```
//! use chibi_queue::keys;
//!
//! let claim_key = keys::worker_claim_key("host:1234:default");
//! assert_eq!(claim_key, "queue:worker:host:1234:default");
//! ```

/// Set of registered worker ids
pub const WORKERS_SET_KEY: &str = "queue:workers";

/// Prefix for per-worker claim payloads
///
/// Format: `queue:worker:{worker_id}`
pub const WORKER_CLAIM_PREFIX: &str = "queue:worker";

/// Build the claim key for one worker
pub fn worker_claim_key(worker_id: &str) -> String {
    format!("{}:{}", WORKER_CLAIM_PREFIX, worker_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_claim_key() {
        assert_eq!(worker_claim_key("host:1:low"), "queue:worker:host:1:low");
    }
}
