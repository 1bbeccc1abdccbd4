//! Stored row models and their insert/update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{PermissionId, RoleId, UserId};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    /// PHC-format argon2 hash. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
}

/// A stored role: `{id, code, display_name}` with a unique, stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub code: Option<String>,
    pub display_name: Option<String>,
}

/// A stored permission: `{id, code, display_name}` with a unique, stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionUpdate {
    pub code: Option<String>,
    pub display_name: Option<String>,
}
