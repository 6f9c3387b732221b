use serde::{Deserialize, Serialize};

use crate::{SchoolId, UserId};

/// User information resolved for the current request by the auth gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    school_id: SchoolId,
    display_name: String,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(user_id: UserId, school_id: SchoolId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            school_id,
            display_name: display_name.into(),
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the school the identity is acting within.
    #[must_use]
    pub fn school_id(&self) -> &SchoolId {
        &self.school_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
