//! User↔role relationship endpoints (nested under /users).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use warden_core::{RoleId, UserId};

use crate::app::requirements::ops;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_operation;
use crate::context::PrincipalContext;

fn parse_user_id(id: &str) -> Result<UserId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id")
    })
}

fn parse_role_id(id: &str) -> Result<RoleId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid role id")
    })
}

async fn ensure_user_exists(
    services: &AppServices,
    id: UserId,
) -> Result<(), axum::response::Response> {
    match services.users.get(id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "user not found",
        )),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

/// GET /users/:id/roles — roles assigned to a user.
pub async fn list_roles_of_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_ROLE_LIST) {
        return resp;
    }

    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = ensure_user_exists(&services, id).await {
        return resp;
    }

    match services.assignments.roles_of_user(id).await {
        Ok(roles) => {
            tracing::info!(user_id = %id, count = roles.len(), "listed user roles");
            let items: Vec<_> = roles.iter().map(dto::role_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /users/:id/permissions — permissions a user holds through its roles.
pub async fn list_permissions_of_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) =
        authorize_operation(&services.catalog, &principal, ops::USER_PERMISSION_LIST)
    {
        return resp;
    }

    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = ensure_user_exists(&services, id).await {
        return resp;
    }

    match services.assignments.permissions_of_user(id).await {
        Ok(permissions) => {
            tracing::info!(user_id = %id, count = permissions.len(), "listed user permissions");
            let items: Vec<_> = permissions.iter().map(dto::permission_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /users/:id/roles/:role_id — assign a role to a user.
pub async fn assign_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, role_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_ROLE_ASSIGN) {
        return resp;
    }

    let user_id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role_id = match parse_role_id(&role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.assignments.assign_role(user_id, role_id).await {
        Ok(()) => {
            tracing::info!(user_id = %user_id, role_id = %role_id, "role assigned");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::warn!(user_id = %user_id, role_id = %role_id, error = %e, "role assignment failed");
            errors::store_error_to_response(e)
        }
    }
}

/// DELETE /users/:id/roles/:role_id — remove a role from a user.
pub async fn remove_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, role_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_ROLE_REMOVE) {
        return resp;
    }

    let user_id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role_id = match parse_role_id(&role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.assignments.remove_role(user_id, role_id).await {
        Ok(true) => {
            tracing::info!(user_id = %user_id, role_id = %role_id, "role removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "assignment not found")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
