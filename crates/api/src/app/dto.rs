use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_store::{PermissionRecord, RoleRecord, UserRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub code: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub code: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub code: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub code: Option<String>,
    pub display_name: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub username: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &UserRecord) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "username": user.username,
        "display_name": user.display_name,
        "created_at": user.created_at,
        "updated_at": user.updated_at,
    })
}

pub fn role_to_json(role: &RoleRecord) -> serde_json::Value {
    serde_json::json!({
        "id": role.id.to_string(),
        "code": role.code,
        "display_name": role.display_name,
    })
}

pub fn permission_to_json(permission: &PermissionRecord) -> serde_json::Value {
    serde_json::json!({
        "id": permission.id.to_string(),
        "code": permission.code,
        "display_name": permission.display_name,
    })
}
