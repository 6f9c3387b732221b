use axum::Json;
use axum::extract::{Query, State};
use chrono::{Duration, Utc};

use crate::dto::{EndpointUsageResponse, UsageQuery, UsageSummaryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_WINDOW_HOURS: i64 = 24;
const MAX_WINDOW_HOURS: i64 = 720;
const ENDPOINT_LIMIT: i64 = 10;

/// Summarizes platform usage over a trailing window.
pub async fn usage_summary_handler(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> ApiResult<Json<UsageSummaryResponse>> {
    let window_hours = query
        .window_hours
        .unwrap_or(DEFAULT_WINDOW_HOURS)
        .clamp(1, MAX_WINDOW_HOURS);
    let since = Utc::now() - Duration::hours(window_hours);

    let daily_active_users = state.analytics.daily_active_users(since).await?;
    let average_response_time_ms = state.analytics.average_response_time(since).await?;
    let endpoints = state
        .analytics
        .endpoint_usage(since, ENDPOINT_LIMIT)
        .await?
        .into_iter()
        .map(|usage| EndpointUsageResponse {
            endpoint: usage.endpoint,
            requests: usage.requests,
            average_response_time_ms: usage.average_response_time_ms,
        })
        .collect();

    Ok(Json(UsageSummaryResponse {
        window_hours,
        daily_active_users,
        average_response_time_ms,
        endpoints,
    }))
}
