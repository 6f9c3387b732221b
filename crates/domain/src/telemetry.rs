//! Wire model for the background telemetry queue.
//!
//! Every payload is plain JSON-serializable data because it crosses a
//! process boundary: producers and the queue consumer are deployed
//! independently, so the schema must stay backward compatible (additive
//! fields only, unknown fields tolerated on decode).

use std::str::FromStr;

use ardoise_core::{AppError, SchoolId, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Stable audit actions recorded against domain tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A record was created.
    Create,
    /// A record was updated.
    Update,
    /// A record was deleted.
    Delete,
    /// A record was read.
    View,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::View => "view",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "view" => Ok(Self::View),
            _ => Err(AppError::Validation(format!(
                "unknown audit action value '{value}'"
            ))),
        }
    }
}

/// HTTP methods tracked by API metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns a stable storage value for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown HTTP method value '{value}'"
            ))),
        }
    }
}

/// Caller network metadata captured from request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetadata {
    /// Caller IP address if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Caller user-agent if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One audit trail entry describing a mutation or read of a domain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    /// School the audited record belongs to.
    pub school_id: SchoolId,
    /// Acting user.
    pub user_id: UserId,
    /// What happened to the record.
    pub action: AuditAction,
    /// Target table name.
    pub table_name: String,
    /// Target record identifier.
    pub record_id: String,
    /// Snapshot of the record before the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_values: Option<Value>,
    /// Snapshot of the record after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_values: Option<Value>,
    /// Caller network metadata.
    #[serde(flatten)]
    pub network: NetworkMetadata,
}

/// One user-activity entry pending batched persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogRecord {
    /// Acting user, when a session was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// School scope, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<SchoolId>,
    /// Free-form action label (e.g. `create`, `view`, `list`).
    pub action: String,
    /// Resource kind the action touched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Specific resource identifier, when the path carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Extra structured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Caller network metadata.
    #[serde(flatten)]
    pub network: NetworkMetadata,
}

/// One API request measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMetricRecord {
    /// Endpoint path that served the request.
    pub endpoint: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Response status code.
    pub status_code: u16,
    /// Total handling time in milliseconds.
    pub response_time_ms: u64,
    /// Acting user, when a session was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// School scope, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<SchoolId>,
    /// Server error detail for failed requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A record plus the epoch-millisecond timestamp assigned by the producer.
///
/// The timestamp is always stamped where the record enters the pipeline,
/// never supplied by domain callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<T> {
    /// The wrapped record, flattened into the payload object.
    #[serde(flatten)]
    pub record: T,
    /// Epoch milliseconds at which the producer accepted the record.
    pub timestamp: i64,
}

impl<T> Stamped<T> {
    /// Wraps a record with the current epoch-millisecond timestamp.
    #[must_use]
    pub fn now(record: T) -> Self {
        Self {
            record,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Wraps a record with an explicit timestamp (decode and test paths).
    #[must_use]
    pub fn with_timestamp(record: T, timestamp: i64) -> Self {
        Self { record, timestamp }
    }
}

/// Envelope for every message crossing the telemetry queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LogMessage {
    /// Audit trail entry.
    AuditLog(Stamped<AuditLogRecord>),
    /// User activity entry.
    ActivityLog(Stamped<ActivityLogRecord>),
    /// API request measurement.
    ApiMetric(Stamped<ApiMetricRecord>),
}

impl LogMessage {
    /// Stamps and wraps an audit record.
    #[must_use]
    pub fn audit_log(record: AuditLogRecord) -> Self {
        Self::AuditLog(Stamped::now(record))
    }

    /// Stamps and wraps an activity record.
    #[must_use]
    pub fn activity_log(record: ActivityLogRecord) -> Self {
        Self::ActivityLog(Stamped::now(record))
    }

    /// Stamps and wraps an API metric record.
    #[must_use]
    pub fn api_metric(record: ApiMetricRecord) -> Self {
        Self::ApiMetric(Stamped::now(record))
    }

    /// Returns the wire discriminant for diagnostics.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::AuditLog(_) => "audit_log",
            Self::ActivityLog(_) => "activity_log",
            Self::ApiMetric(_) => "api_metric",
        }
    }

    /// Returns the producer-side timestamp in epoch milliseconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::AuditLog(stamped) => stamped.timestamp,
            Self::ActivityLog(stamped) => stamped.timestamp,
            Self::ApiMetric(stamped) => stamped.timestamp,
        }
    }
}

/// Decodes a payload while tolerating fields added by newer producers.
pub fn decode_payload<T: DeserializeOwned>(value: &str) -> Result<T, AppError> {
    serde_json::from_str(value)
        .map_err(|error| AppError::Validation(format!("invalid telemetry payload: {error}")))
}

#[cfg(test)]
mod tests {
    use ardoise_core::{SchoolId, UserId};
    use chrono::Utc;

    use ardoise_core::AppError;

    use super::{
        ActivityLogRecord, AuditAction, AuditLogRecord, HttpMethod, LogMessage, NetworkMetadata,
        Stamped, decode_payload,
    };

    fn sample_audit_record() -> AuditLogRecord {
        AuditLogRecord {
            school_id: SchoolId::new("s1"),
            user_id: UserId::new("u1"),
            action: AuditAction::Delete,
            table_name: "students".to_owned(),
            record_id: "r1".to_owned(),
            old_values: None,
            new_values: None,
            network: NetworkMetadata::default(),
        }
    }

    #[test]
    fn audit_message_uses_snake_case_discriminant_and_nested_payload() {
        let message = LogMessage::AuditLog(Stamped::with_timestamp(sample_audit_record(), 1_234));
        let encoded = serde_json::to_value(&message).unwrap_or_default();

        assert_eq!(encoded["type"], "audit_log");
        assert_eq!(encoded["payload"]["action"], "delete");
        assert_eq!(encoded["payload"]["timestamp"], 1_234);
        assert!(encoded["payload"].get("old_values").is_none());
    }

    #[test]
    fn producer_constructors_stamp_current_time() {
        let before = Utc::now().timestamp_millis();
        let message = LogMessage::audit_log(sample_audit_record());
        let after = Utc::now().timestamp_millis();

        assert_eq!(message.message_type(), "audit_log");
        assert!(message.timestamp() >= before);
        assert!(message.timestamp() <= after);
    }

    #[test]
    fn decode_tolerates_fields_from_newer_producers() {
        let raw = r#"{
            "type": "activity_log",
            "payload": {
                "action": "view",
                "timestamp": 42,
                "added_in_a_future_release": true
            }
        }"#;

        let decoded = decode_payload::<LogMessage>(raw);
        let Ok(LogMessage::ActivityLog(stamped)) = decoded else {
            panic!("expected an activity_log message");
        };
        assert_eq!(stamped.timestamp, 42);
        assert_eq!(stamped.record.action, "view");
        assert!(stamped.record.user_id.is_none());
    }

    #[test]
    fn malformed_payload_decodes_to_a_validation_error() {
        let decoded = decode_payload::<LogMessage>("{\"type\": \"audit_log\"");
        assert!(matches!(decoded, Err(AppError::Validation(_))));
    }

    #[test]
    fn flattened_network_metadata_lands_in_the_payload_root() {
        let record = ActivityLogRecord {
            user_id: Some(UserId::new("u1")),
            school_id: None,
            action: "list".to_owned(),
            resource: Some("grades".to_owned()),
            resource_id: None,
            metadata: None,
            network: NetworkMetadata {
                ip_address: Some("203.0.113.7".to_owned()),
                user_agent: None,
            },
        };

        let encoded =
            serde_json::to_value(LogMessage::ActivityLog(Stamped::with_timestamp(record, 1)))
                .unwrap_or_default();
        assert_eq!(encoded["payload"]["ip_address"], "203.0.113.7");
        assert!(encoded["payload"].get("network").is_none());
    }

    #[test]
    fn http_method_storage_values_are_uppercase() {
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert!(matches!("DELETE".parse(), Ok(HttpMethod::Delete)));
        assert!("delete".parse::<HttpMethod>().is_err());
    }
}
