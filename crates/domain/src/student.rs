use ardoise_core::SchoolId;
use serde::{Deserialize, Serialize};

/// One enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Stable student identifier.
    pub id: String,
    /// School the student is enrolled in.
    pub school_id: SchoolId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Optional national or school-issued identification number.
    pub id_number: Option<String>,
}

/// Input payload for student creation and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Optional identification number.
    pub id_number: Option<String>,
}
