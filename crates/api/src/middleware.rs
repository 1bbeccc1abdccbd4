use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use warden_auth::{AccessError, GrantSource, TokenError, TokenVerifier};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub grants: Arc<dyn GrantSource>,
}

/// Bearer-auth middleware: extract credential → verify → load grants →
/// attach [`PrincipalContext`].
///
/// The three steps are strictly sequential for one request; nothing here is
/// shared mutable state. Lookup faults are surfaced as 500, never as a deny.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(err) => return unauthenticated(err),
    };

    let claims = match state.verifier.verify(token, Utc::now()) {
        Ok(claims) => claims,
        Err(err) => return unauthenticated(AccessError::Unauthenticated(err)),
    };

    let grants = match state.grants.grant_set(claims.sub).await {
        Ok(grants) => grants,
        Err(err) => {
            tracing::error!(user_id = %claims.sub, error = %err, "grant lookup failed");
            return errors::json_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "lookup_error",
                "failed to load grants",
            );
        }
    };

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, grants));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AccessError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AccessError::MissingCredential)?;

    let header = header.to_str().map_err(|_| AccessError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AccessError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AccessError::MissingCredential);
    }

    Ok(token)
}

/// Uniform 401 envelope; the failure kind stays distinguishable in logs and
/// in the machine-readable error code.
fn unauthenticated(err: AccessError) -> Response {
    tracing::warn!(error = %err, "request unauthenticated");

    let code = match &err {
        AccessError::MissingCredential => "missing_credential",
        AccessError::Unauthenticated(TokenError::Expired) => "expired_credential",
        AccessError::Unauthenticated(TokenError::Invalid) => "invalid_credential",
        AccessError::Denied(_) => "forbidden",
    };

    errors::json_error(axum::http::StatusCode::UNAUTHORIZED, code, err.to_string())
}
