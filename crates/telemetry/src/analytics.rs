//! Read-side port over persisted telemetry.

use ardoise_core::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Request volume and latency for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUsage {
    /// Endpoint path.
    pub endpoint: String,
    /// Number of requests observed in the window.
    pub requests: i64,
    /// Average response time in milliseconds, rounded.
    pub average_response_time_ms: i64,
}

/// Usage analytics derived from activity logs and API metrics.
#[async_trait]
pub trait ActivityAnalytics: Send + Sync {
    /// Number of distinct users active since the given instant.
    async fn daily_active_users(&self, since: DateTime<Utc>) -> AppResult<i64>;

    /// Busiest endpoints since the given instant, by request count.
    async fn endpoint_usage(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<EndpointUsage>>;

    /// Average API response time in milliseconds since the given instant.
    async fn average_response_time(&self, since: DateTime<Utc>) -> AppResult<i64>;
}
