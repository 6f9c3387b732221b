use ardoise_core::{AppError, UserIdentity};
use ardoise_domain::{AuditAction, AuditLogRecord, NetworkMetadata, Student, StudentInput};
use ardoise_telemetry::producer;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;

use crate::dto::{SaveStudentRequest, StudentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_students_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<StudentResponse>>> {
    let students = state
        .student_repository
        .list_for_school(identity.school_id())
        .await?;

    Ok(Json(students.into_iter().map(Into::into).collect()))
}

pub async fn get_student_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<StudentResponse>> {
    let student = state
        .student_repository
        .find(identity.school_id(), &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student '{student_id}' not found")))?;

    Ok(Json(student.into()))
}

pub async fn create_student_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Extension(network): Extension<NetworkMetadata>,
    Json(payload): Json<SaveStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let input = validate_student_input(payload)?;
    let student = state
        .student_repository
        .create(identity.school_id(), input)
        .await?;

    queue_student_audit(
        &identity,
        network,
        AuditAction::Create,
        &student.id,
        None,
        Some(&student),
    );

    Ok((StatusCode::CREATED, Json(student.into())))
}

pub async fn update_student_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Extension(network): Extension<NetworkMetadata>,
    Path(student_id): Path<String>,
    Json(payload): Json<SaveStudentRequest>,
) -> ApiResult<Json<StudentResponse>> {
    let input = validate_student_input(payload)?;
    let before = state
        .student_repository
        .find(identity.school_id(), &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student '{student_id}' not found")))?;
    let student = state
        .student_repository
        .update(identity.school_id(), &student_id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student '{student_id}' not found")))?;

    queue_student_audit(
        &identity,
        network,
        AuditAction::Update,
        &student_id,
        Some(&before),
        Some(&student),
    );

    Ok(Json(student.into()))
}

pub async fn delete_student_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Extension(network): Extension<NetworkMetadata>,
    Path(student_id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state
        .student_repository
        .delete(identity.school_id(), &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student '{student_id}' not found")))?;

    queue_student_audit(
        &identity,
        network,
        AuditAction::Delete,
        &student_id,
        Some(&removed),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}

fn validate_student_input(payload: SaveStudentRequest) -> Result<StudentInput, AppError> {
    let first_name = payload.first_name.trim().to_owned();
    let last_name = payload.last_name.trim().to_owned();

    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name must not be empty".to_owned(),
        ));
    }

    Ok(StudentInput {
        first_name,
        last_name,
        id_number: payload
            .id_number
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty()),
    })
}

fn queue_student_audit(
    identity: &UserIdentity,
    network: NetworkMetadata,
    action: AuditAction,
    record_id: &str,
    old: Option<&Student>,
    new: Option<&Student>,
) {
    producer::queue_audit_log(AuditLogRecord {
        school_id: identity.school_id().clone(),
        user_id: identity.user_id().clone(),
        action,
        table_name: "students".to_owned(),
        record_id: record_id.to_owned(),
        old_values: old.map(snapshot),
        new_values: new.map(snapshot),
        network,
    });
}

fn snapshot(student: &Student) -> Value {
    serde_json::to_value(student).unwrap_or(Value::Null)
}
