use serde::{Deserialize, Serialize};

use crate::session_management::Role;
use crate::storage::types::Doctor;

/// The authenticated user, mirrored under the `currentUser` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// `"admin"` for the admin account, the doctor's id otherwise.
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Session {
    pub fn admin(username: &str) -> Self {
        Self {
            id: "admin".to_string(),
            username: username.to_string(),
            role: Role::Admin,
            name: None,
        }
    }

    pub fn doctor(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id.to_string(),
            username: doctor.username.clone(),
            role: Role::Doctor,
            name: Some(doctor.name.clone()),
        }
    }

    /// Name shown on records and emails, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}
