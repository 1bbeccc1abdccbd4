//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: backend selection and wiring (stores, token service)
//! - `requirements.rs`: per-operation requirement declarations
//! - `routes/`: HTTP routes + handlers (one file per management area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::post};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod requirements;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub async fn build_app(config: ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&config).await?);

    let auth_state = middleware::AuthState {
        verifier: services.tokens.clone(),
        grants: services.grants.clone(),
    };

    // Protected routes: credential verification + grant loading first, then
    // the per-operation guard inside each handler.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(services.clone())),
    );

    let public = Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register))
        .layer(Extension(services));

    Ok(Router::new().merge(public).merge(protected))
}
