use ardoise_domain::Student;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Query parameters for the usage summary endpoint.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Lookback window in hours. Defaults to 24, clamped to 1..=720.
    pub window_hours: Option<i64>,
}

/// Request volume and latency for one endpoint.
#[derive(Debug, Serialize)]
pub struct EndpointUsageResponse {
    pub endpoint: String,
    pub requests: i64,
    pub average_response_time_ms: i64,
}

/// Aggregated usage analytics over the requested window.
#[derive(Debug, Serialize)]
pub struct UsageSummaryResponse {
    pub window_hours: i64,
    pub daily_active_users: i64,
    pub average_response_time_ms: i64,
    pub endpoints: Vec<EndpointUsageResponse>,
}

/// Incoming payload for a manually recorded activity entry.
#[derive(Debug, Deserialize)]
pub struct ManualActivityRequest {
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<Value>,
}

/// Incoming payload for student creation and updates.
#[derive(Debug, Deserialize)]
pub struct SaveStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
}

/// API representation of a student.
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: String,
    pub school_id: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
}

impl From<Student> for StudentResponse {
    fn from(value: Student) -> Self {
        Self {
            id: value.id,
            school_id: value.school_id.as_str().to_owned(),
            first_name: value.first_name,
            last_name: value.last_name,
            id_number: value.id_number,
        }
    }
}
