//! Role↔permission relationship endpoints (nested under /roles).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use warden_core::{PermissionId, RoleId};

use crate::app::requirements::ops;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_operation;
use crate::context::PrincipalContext;

fn parse_role_id(id: &str) -> Result<RoleId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid role id")
    })
}

fn parse_permission_id(id: &str) -> Result<PermissionId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid permission id")
    })
}

/// GET /roles/:id/permissions — permissions granted to a role.
pub async fn list_permissions_of_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) =
        authorize_operation(&services.catalog, &principal, ops::ROLE_PERMISSION_LIST)
    {
        return resp;
    }

    let id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.roles.get(id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.assignments.permissions_of_role(id).await {
        Ok(permissions) => {
            tracing::info!(role_id = %id, count = permissions.len(), "listed role permissions");
            let items: Vec<_> = permissions.iter().map(dto::permission_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /roles/:id/permissions/:permission_id — grant a permission to a role.
pub async fn grant_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, permission_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(resp) =
        authorize_operation(&services.catalog, &principal, ops::ROLE_PERMISSION_GRANT)
    {
        return resp;
    }

    let role_id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let permission_id = match parse_permission_id(&permission_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .assignments
        .grant_permission(role_id, permission_id)
        .await
    {
        Ok(()) => {
            tracing::info!(role_id = %role_id, permission_id = %permission_id, "permission granted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::warn!(
                role_id = %role_id,
                permission_id = %permission_id,
                error = %e,
                "permission grant failed"
            );
            errors::store_error_to_response(e)
        }
    }
}

/// DELETE /roles/:id/permissions/:permission_id — revoke a permission.
pub async fn revoke_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, permission_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(resp) =
        authorize_operation(&services.catalog, &principal, ops::ROLE_PERMISSION_REVOKE)
    {
        return resp;
    }

    let role_id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let permission_id = match parse_permission_id(&permission_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .assignments
        .revoke_permission(role_id, permission_id)
        .await
    {
        Ok(true) => {
            tracing::info!(role_id = %role_id, permission_id = %permission_id, "permission revoked");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "grant not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
