//! Login, registration, and the authenticated profile endpoint.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use warden_auth::{hash_password, verify_password};
use warden_store::NewUser;

use crate::app::requirements::ops;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

/// POST /auth/login — verify username + password, mint a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    tracing::info!(username = %body.username, "login requested");

    let user = match services.users.get_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(username = %body.username, "login failed: unknown username");
            return errors::bad_credentials();
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(username = %body.username, "login failed: wrong password");
            return errors::bad_credentials();
        }
        Err(e) => {
            tracing::error!(username = %body.username, error = %e, "password check failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "password_error",
                "failed to check password",
            );
        }
    }

    let issued = match services.tokens.issue(user.id, Utc::now()) {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!(username = %body.username, error = %e, "token signing failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "signing_error",
                "failed to issue credential",
            );
        }
    };

    tracing::info!(username = %body.username, user_id = %user.id, "login succeeded");

    (
        StatusCode::OK,
        Json(dto::LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user_id: user.id.to_string(),
            username: user.username,
        }),
    )
        .into_response()
}

/// POST /auth/register — create an account with no roles.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    tracing::info!(username = %body.username, "registration requested");

    let username = body.username.trim().to_string();
    if username.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "username cannot be empty",
        );
    }
    if body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "password cannot be empty",
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
    let created = match services
        .users
        .insert(NewUser {
            username,
            display_name,
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(username = %created.username, user_id = %created.id, "registration succeeded");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": created.id.to_string() })),
    )
        .into_response()
}

/// GET /auth/me — the authenticated caller's own record and grants.
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::authorize_operation(&services.catalog, &principal, ops::AUTH_ME)
    {
        return resp;
    }

    let user = match services.users.get(principal.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Token subject no longer exists (deleted after issuance).
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut roles: Vec<&str> = principal
        .grants()
        .roles
        .iter()
        .map(|r| r.as_str())
        .collect();
    roles.sort_unstable();
    let mut permissions: Vec<&str> = principal
        .grants()
        .permissions
        .iter()
        .map(|p| p.as_str())
        .collect();
    permissions.sort_unstable();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "user": dto::user_to_json(&user),
            "roles": roles,
            "permissions": permissions,
        })),
    )
        .into_response()
}
