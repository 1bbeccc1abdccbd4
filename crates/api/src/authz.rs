//! API-side authorization guard.
//!
//! This enforces the per-operation requirement at the handler boundary
//! (before any store work), keeping the decision itself in `warden-auth`.

use axum::http::StatusCode;
use axum::response::Response;

use warden_auth::{RequirementCatalog, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Check the named operation's resolved requirement against the principal.
///
/// Intended to be called first in every protected handler; returns the
/// ready-to-send rejection on deny so handlers can early-return it.
pub fn authorize_operation(
    catalog: &RequirementCatalog,
    principal: &PrincipalContext,
    operation: &'static str,
) -> Result<(), Response> {
    let Some(requirement) = catalog.requirement_of(operation) else {
        // A miss is a wiring bug, not an authorization decision: fail closed
        // as an internal error rather than a deny.
        tracing::error!(operation, "operation missing from requirement catalog");
        return Err(errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unregistered_operation",
            "operation not registered",
        ));
    };

    if let Err(err) = authorize(principal.grants(), requirement) {
        tracing::warn!(
            operation,
            user_id = %principal.user_id(),
            error = %err,
            "authorization denied"
        );
        return Err(errors::forbidden(&err));
    }

    Ok(())
}
