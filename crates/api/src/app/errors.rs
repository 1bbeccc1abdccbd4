use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_auth::AuthzError;
use warden_store::StoreError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn forbidden(err: &AuthzError) -> axum::response::Response {
    let code = match err {
        AuthzError::InsufficientRole(_) => "insufficient_role",
        AuthzError::InsufficientPermission(_) => "insufficient_permission",
    };
    json_error(StatusCode::FORBIDDEN, code, err.to_string())
}

/// Login rejections are deliberately uniform: unknown username and wrong
/// password are indistinguishable on the wire.
pub fn bad_credentials() -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "bad_credentials", "bad credentials")
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::InvalidReference(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "storage backend failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}
