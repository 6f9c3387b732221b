//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod student;
mod telemetry;

pub use student::{Student, StudentInput};
pub use telemetry::{
    ActivityLogRecord, ApiMetricRecord, AuditAction, AuditLogRecord, HttpMethod, LogMessage,
    NetworkMetadata, Stamped, decode_payload,
};
