//! Backend selection and service wiring.

use std::sync::Arc;

use chrono::Duration;

use warden_auth::{GrantSource, Hs256TokenService, RequirementCatalog, hash_password};
use warden_store::{
    AssignmentStore, MemoryStore, NewPermission, NewRole, NewUser, PermissionStore, PgStore,
    RoleStore, UserStore,
};

use crate::app::requirements;
use crate::config::ApiConfig;

/// Everything the handlers need, behind trait objects so the transport layer
/// never depends on a concrete persistence technology.
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub grants: Arc<dyn GrantSource>,
    pub tokens: Arc<Hs256TokenService>,
    /// Per-operation requirements, resolved once at startup.
    pub catalog: RequirementCatalog,
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let tokens = Arc::new(Hs256TokenService::new(
        config.jwt_secret.as_bytes(),
        Duration::seconds(config.token_ttl_secs),
    ));
    let catalog = requirements::catalog();

    match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            tracing::info!("using postgres backend");
            Ok(AppServices {
                users: store.clone(),
                roles: store.clone(),
                permissions: store.clone(),
                assignments: store.clone(),
                grants: store,
                tokens,
                catalog,
            })
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory backend");
            let store = Arc::new(MemoryStore::new());
            seed_defaults(store.as_ref(), &config.admin_password).await?;
            Ok(AppServices {
                users: store.clone(),
                roles: store.clone(),
                permissions: store.clone(),
                assignments: store.clone(),
                grants: store,
                tokens,
                catalog,
            })
        }
    }
}

/// Seed the memory backend with the admin role, the user-management
/// permissions, and an `admin` account. Postgres deployments seed alongside
/// their externally managed schema instead.
async fn seed_defaults(store: &MemoryStore, admin_password: &str) -> anyhow::Result<()> {
    let admin_role = RoleStore::insert(
        store,
        NewRole {
            code: "admin".to_string(),
            display_name: "Administrator".to_string(),
        },
    )
    .await?;

    for (code, display_name) in [
        ("user:view", "View users"),
        ("user:create", "Create users"),
        ("user:update", "Update users"),
        ("user:delete", "Delete users"),
    ] {
        let permission = PermissionStore::insert(
            store,
            NewPermission {
                code: code.to_string(),
                display_name: display_name.to_string(),
            },
        )
        .await?;
        store.grant_permission(admin_role.id, permission.id).await?;
    }

    let admin = UserStore::insert(
        store,
        NewUser {
            username: "admin".to_string(),
            display_name: "Administrator".to_string(),
            password_hash: hash_password(admin_password)?,
        },
    )
    .await?;
    store.assign_role(admin.id, admin_role.id).await?;

    tracing::info!("seeded default admin account and role");
    Ok(())
}
