//! Role management endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use warden_core::RoleId;
use warden_store::{NewRole, RoleUpdate};

use crate::app::requirements::ops;
use crate::app::routes::role_permissions;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_operation;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/:id",
            get(get_role).patch(update_role).delete(delete_role),
        )
        .route(
            "/:id/permissions",
            get(role_permissions::list_permissions_of_role),
        )
        .route(
            "/:id/permissions/:permission_id",
            axum::routing::post(role_permissions::grant_permission)
                .delete(role_permissions::revoke_permission),
        )
}

fn parse_role_id(id: &str) -> Result<RoleId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid role id")
    })
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::ROLE_LIST) {
        return resp;
    }

    let roles = match services.roles.list().await {
        Ok(roles) => roles,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(count = roles.len(), "listed roles");
    let items: Vec<_> = roles.iter().map(dto::role_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::ROLE_LIST) {
        return resp;
    }

    let id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.roles.get(id).await {
        Ok(Some(role)) => (StatusCode::OK, Json(dto::role_to_json(&role))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::ROLE_CREATE) {
        return resp;
    }

    tracing::info!(code = %body.code, "create role requested");

    let code = body.code.trim().to_string();
    if code.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "role code cannot be empty",
        );
    }

    let display_name = body.display_name.unwrap_or_else(|| code.clone());
    match services.roles.insert(NewRole { code, display_name }).await {
        Ok(role) => {
            tracing::info!(role_id = %role.id, code = %role.code, "role created");
            (StatusCode::CREATED, Json(dto::role_to_json(&role))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateRoleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::ROLE_UPDATE) {
        return resp;
    }

    let id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let update = RoleUpdate {
        code: body.code,
        display_name: body.display_name,
    };

    match services.roles.update(id, update).await {
        Ok(true) => {
            tracing::info!(role_id = %id, "role updated");
            (StatusCode::OK, Json(serde_json::json!({ "id": id.to_string() }))).into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::ROLE_DELETE) {
        return resp;
    }

    let id = match parse_role_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.roles.delete(id).await {
        Ok(true) => {
            tracing::info!(role_id = %id, "role deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
