use std::time::Instant;

use ardoise_core::{AppError, SchoolId, UserId, UserIdentity};
use ardoise_domain::{ActivityLogRecord, ApiMetricRecord, HttpMethod, NetworkMetadata};
use ardoise_telemetry::{producer, scope};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::classifier::classify_request;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the gateway-authenticated identity for protected routes.
///
/// Session lookup happens upstream at the auth gateway; this host trusts the
/// identity headers only when they arrive with the shared secret.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let headers = request.headers();
    let authenticated = header_value(headers, "x-gateway-secret")
        .is_some_and(|presented| secrets_match(&presented, &state.gateway_shared_secret));
    if !authenticated {
        return Err(AppError::Unauthorized("gateway authentication required".to_owned()).into());
    }

    let user_id = header_value(headers, "x-user-id")
        .ok_or_else(|| AppError::Unauthorized("missing user identity".to_owned()))?;
    let school_id = header_value(headers, "x-school-id")
        .ok_or_else(|| AppError::Unauthorized("missing school scope".to_owned()))?;
    let display_name = header_value(headers, "x-display-name").unwrap_or_else(|| user_id.clone());

    let identity = UserIdentity::new(
        UserId::new(user_id),
        SchoolId::new(school_id),
        display_name,
    );
    let network = network_metadata(request.headers());
    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(network);

    Ok(next.run(request).await)
}

/// Records a user-activity entry for successful, classifiable requests.
///
/// Runs inside the session layer so the actor is known; requests without a
/// classification or without a resolved session are simply not logged.
pub async fn record_activity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request.extensions().get::<UserIdentity>().cloned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let network = network_metadata(request.headers());

    let mut response = next.run(request).await;

    if let Some(identity) = identity {
        // Hand the actor to the outer metric layer.
        response.extensions_mut().insert(identity.clone());

        if response.status().as_u16() < 400 {
            if let Some(classification) = classify_request(&method, &path) {
                state.batcher.enqueue(ActivityLogRecord {
                    user_id: Some(identity.user_id().clone()),
                    school_id: Some(identity.school_id().clone()),
                    action: classification.action,
                    resource: Some(classification.resource),
                    resource_id: classification.resource_id,
                    metadata: None,
                    network,
                });
            }
        }
    }

    response
}

/// Outermost telemetry layer: establishes the request's execution scope,
/// installs the lifecycle and queue handles, and queues an API metric for
/// every measured response.
pub async fn track_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    scope::with_scope(async move {
        scope::set_lifecycle_extender(state.lifecycle_extender.clone());
        scope::set_queue_binding(state.queue_binding.clone());

        let response = next.run(request).await;

        if let Ok(http_method) = method.as_str().parse::<HttpMethod>() {
            let status = response.status();
            let identity = response.extensions().get::<UserIdentity>();
            producer::queue_api_metric(ApiMetricRecord {
                endpoint: path,
                method: http_method,
                status_code: status.as_u16(),
                response_time_ms: u64::try_from(started.elapsed().as_millis())
                    .unwrap_or(u64::MAX),
                user_id: identity.map(|value| value.user_id().clone()),
                school_id: identity.map(|value| value.school_id().clone()),
                error_message: status
                    .is_server_error()
                    .then(|| status.canonical_reason().unwrap_or("server error").to_owned()),
            });
        }

        response
    })
    .await
}

/// Compares two secrets without short-circuiting on the first mismatching
/// byte, so response timing does not reveal how much of a guess matched.
fn secrets_match(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }

    presented
        .bytes()
        .zip(expected.bytes())
        .fold(0_u8, |acc, (lhs, rhs)| acc | (lhs ^ rhs))
        == 0
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn network_metadata(headers: &HeaderMap) -> NetworkMetadata {
    NetworkMetadata {
        ip_address: header_value(headers, "x-forwarded-for")
            .map(|value| value.split(',').next().unwrap_or_default().trim().to_owned()),
        user_agent: header_value(headers, "user-agent"),
    }
}

#[cfg(test)]
mod tests {
    use super::secrets_match;

    #[test]
    fn matching_secrets_are_accepted() {
        assert!(secrets_match("gateway-secret-123", "gateway-secret-123"));
    }

    #[test]
    fn mismatched_and_truncated_secrets_are_rejected() {
        assert!(!secrets_match("gateway-secret-124", "gateway-secret-123"));
        assert!(!secrets_match("gateway", "gateway-secret-123"));
        assert!(!secrets_match("", "gateway-secret-123"));
    }
}
