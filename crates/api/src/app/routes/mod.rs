use axum::{Router, routing::get};

pub mod auth;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod system;
pub mod user_roles;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
}
