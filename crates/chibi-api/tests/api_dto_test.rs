//! Integration tests for API DTOs and handler plumbing
//!
//! These tests exercise the request/response types the handlers are built
//! on. For full integration testing against Postgres and Redis, set
//! DATABASE_URL and REDIS_URL.

#[cfg(test)]
mod tests {
    use chibi_api::dto::{
        CdrFilterParams, CdrResponse, InboundMessageRequest, PaginationParams, UserResponse,
        WorkerStatusResponse,
    };
    use chibi_core::models::{Cdr, JobClaim, User, WorkerSnapshot};
    use chrono::{Datelike, Duration, Utc};
    use validator::Validate;

    #[test]
    fn test_cdr_filter_params_from_query_string() {
        let params: CdrFilterParams =
            serde_json::from_str(r#"{"page": 2, "per_page": 10, "direction": "outbound"}"#)
                .unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.pagination.offset(), 10);
        assert_eq!(params.direction.as_deref(), Some("outbound"));
        assert!(params.start_date.is_none());
    }

    #[test]
    fn test_pagination_rejects_out_of_range() {
        let params = PaginationParams {
            page: 0,
            per_page: 50,
        };
        assert!(params.validate().is_err());

        let params = PaginationParams {
            page: 1,
            per_page: 5000,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_cdr_response_preserves_bridge_link() {
        let mut cdr = Cdr::default();
        cdr.uuid = "CA-OUT".to_string();
        cdr.direction = "outbound".to_string();
        cdr.bridge_uuid = Some("CA-IN".to_string());
        cdr.inbound_cdr_id = Some(3);

        let response = CdrResponse::from(cdr);
        assert_eq!(response.bridge_uuid.as_deref(), Some("CA-IN"));
        assert_eq!(response.inbound_cdr_id, Some(3));
    }

    #[test]
    fn test_message_webhook_requires_sender() {
        let request: InboundMessageRequest = serde_json::from_str(
            r#"{"sid": "SM1", "from": "", "to": "+818033334444", "body": "hi"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_user_response_computes_age() {
        let mut user = User::default();
        user.birth_year = Some(Utc::now().year() - 25);

        let response = UserResponse::from(user);
        assert_eq!(response.age, Some(25));
    }

    #[test]
    fn test_worker_status_stale_boundary() {
        let threshold = Duration::minutes(10);
        let now = Utc::now();

        let fresh = WorkerSnapshot {
            id: "host:1:default".to_string(),
            idle: false,
            job: Some(JobClaim {
                run_at: now - Duration::minutes(9),
                payload: serde_json::json!({}),
            }),
        };
        let status = WorkerStatusResponse::from_snapshot(fresh, now, threshold);
        assert!(!status.stale);

        let stale = WorkerSnapshot {
            id: "host:2:default".to_string(),
            idle: false,
            job: Some(JobClaim {
                run_at: now - Duration::minutes(11),
                payload: serde_json::json!({}),
            }),
        };
        let status = WorkerStatusResponse::from_snapshot(stale, now, threshold);
        assert!(status.stale);
    }
}
