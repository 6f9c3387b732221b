use ardoise_core::{AppError, UserIdentity};
use ardoise_domain::{ActivityLogRecord, NetworkMetadata};
use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::ManualActivityRequest;
use crate::error::ApiResult;
use crate::state::AppState;

/// Records an activity entry on behalf of an admin tool, bypassing the batch
/// queue so the caller observes the write.
pub async fn create_activity_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Extension(network): Extension<NetworkMetadata>,
    axum::Json(payload): axum::Json<ManualActivityRequest>,
) -> ApiResult<StatusCode> {
    if payload.action.trim().is_empty() {
        return Err(AppError::Validation("action must not be empty".to_owned()).into());
    }

    state
        .batcher
        .record_now(ActivityLogRecord {
            user_id: Some(identity.user_id().clone()),
            school_id: Some(identity.school_id().clone()),
            action: payload.action,
            resource: payload.resource,
            resource_id: payload.resource_id,
            metadata: payload.metadata,
            network,
        })
        .await?;

    Ok(StatusCode::CREATED)
}
