//! User management endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use warden_auth::hash_password;
use warden_core::UserId;
use warden_store::{NewUser, UserUpdate};

use crate::app::requirements::ops;
use crate::app::routes::user_roles;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_operation;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/:id/roles", get(user_roles::list_roles_of_user))
        .route(
            "/:id/roles/:role_id",
            axum::routing::post(user_roles::assign_role).delete(user_roles::remove_role),
        )
        .route(
            "/:id/permissions",
            get(user_roles::list_permissions_of_user),
        )
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_LIST) {
        return resp;
    }

    let users = match services.users.list().await {
        Ok(users) => users,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(count = users.len(), "listed users");
    let items: Vec<_> = users.iter().map(dto::user_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_DETAIL) {
        return resp;
    }

    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    match services.users.get(id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_CREATE) {
        return resp;
    }

    tracing::info!(username = %body.username, "create user requested");

    let username = body.username.trim().to_string();
    if username.is_empty() || body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "username and password cannot be empty",
        );
    }

    let password_hash = match hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(username = %username, error = %e, "password hashing failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "password_error",
                "failed to hash password",
            );
        }
    };

    let display_name = body.display_name.unwrap_or_else(|| username.clone());
    match services
        .users
        .insert(NewUser {
            username,
            display_name,
            password_hash,
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "user created");
            (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_UPDATE) {
        return resp;
    }

    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    let password_hash = match body.password.as_deref() {
        Some(plain) if plain.is_empty() => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "password cannot be empty",
            );
        }
        Some(plain) => match hash_password(plain) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!(user_id = %id, error = %e, "password hashing failed");
                return errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "password_error",
                    "failed to hash password",
                );
            }
        },
        None => None,
    };

    let update = UserUpdate {
        display_name: body.display_name,
        password_hash,
    };

    match services.users.update(id, update).await {
        Ok(true) => {
            tracing::info!(user_id = %id, "user updated");
            (StatusCode::OK, Json(serde_json::json!({ "id": id.to_string() }))).into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services.catalog, &principal, ops::USER_DELETE) {
        return resp;
    }

    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    match services.users.delete(id).await {
        Ok(true) => {
            tracing::info!(user_id = %id, "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
