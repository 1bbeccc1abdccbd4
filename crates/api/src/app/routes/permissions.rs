//! Permission management endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use warden_core::PermissionId;
use warden_store::{NewPermission, PermissionUpdate};

use crate::app::requirements::ops;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_operation;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route(
            "/:id",
            get(get_permission)
                .patch(update_permission)
                .delete(delete_permission),
        )
}

fn parse_permission_id(id: &str) -> Result<PermissionId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid permission id")
    })
}

pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::PERMISSION_LIST) {
        return resp;
    }

    let permissions = match services.permissions.list().await {
        Ok(permissions) => permissions,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(count = permissions.len(), "listed permissions");
    let items: Vec<_> = permissions.iter().map(dto::permission_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::PERMISSION_LIST) {
        return resp;
    }

    let id = match parse_permission_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.permissions.get(id).await {
        Ok(Some(permission)) => {
            (StatusCode::OK, Json(dto::permission_to_json(&permission))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "permission not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreatePermissionRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::PERMISSION_CREATE) {
        return resp;
    }

    tracing::info!(code = %body.code, "create permission requested");

    let code = body.code.trim().to_string();
    if code.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "permission code cannot be empty",
        );
    }

    let display_name = body.display_name.unwrap_or_else(|| code.clone());
    match services
        .permissions
        .insert(NewPermission { code, display_name })
        .await
    {
        Ok(permission) => {
            tracing::info!(permission_id = %permission.id, code = %permission.code, "permission created");
            (StatusCode::CREATED, Json(dto::permission_to_json(&permission))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePermissionRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::PERMISSION_UPDATE) {
        return resp;
    }

    let id = match parse_permission_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let update = PermissionUpdate {
        code: body.code,
        display_name: body.display_name,
    };

    match services.permissions.update(id, update).await {
        Ok(true) => {
            tracing::info!(permission_id = %id, "permission updated");
            (StatusCode::OK, Json(serde_json::json!({ "id": id.to_string() }))).into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "permission not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::PERMISSION_DELETE) {
        return resp;
    }

    let id = match parse_permission_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.permissions.delete(id).await {
        Ok(true) => {
            tracing::info!(permission_id = %id, "permission deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "permission not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
