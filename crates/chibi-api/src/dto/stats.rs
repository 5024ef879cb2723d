//! Aggregate statistics DTOs

use serde::Serialize;

/// Service-wide counters
///
/// GET /api/v1/stats/overview
#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    pub total_users: i64,
    pub total_messages: i64,
    pub total_phone_calls: i64,
    pub total_cdrs: i64,
    pub missed_calls: i64,
    pub total_call_seconds: i64,
}

/// One demographics bucket (by gender and region)
#[derive(Debug, Clone, Serialize)]
pub struct DemographicsBucket {
    pub gender: Option<String>,
    pub region: Option<String>,
    pub user_count: i64,
}

/// User demographics breakdown
///
/// GET /api/v1/stats/demographics
#[derive(Debug, Clone, Serialize)]
pub struct DemographicsResponse {
    pub buckets: Vec<DemographicsBucket>,
}

/// Daily interaction volumes for the trailing window
#[derive(Debug, Clone, Serialize)]
pub struct DailyInteractions {
    pub date: String,
    pub messages: i64,
    pub calls: i64,
}

/// Message and call volumes per day
///
/// GET /api/v1/stats/interactions
#[derive(Debug, Clone, Serialize)]
pub struct InteractionsResponse {
    pub days: Vec<DailyInteractions>,
}
