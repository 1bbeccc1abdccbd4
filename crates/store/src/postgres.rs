//! Postgres backend.
//!
//! Uses a pooled connection and plain bound queries. Schema management is
//! external; `schema.sql` next to this crate documents the expected DDL.
//!
//! SQLx errors map to [`StoreError`] as follows: unique violations (`23505`)
//! become `Conflict`, foreign-key violations (`23503`) become
//! `InvalidReference`, everything else is a `Backend` fault.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;

use warden_auth::{GrantSource, PermissionCode, RoleCode};
use warden_core::{PermissionId, RoleId, UserId};

use crate::error::StoreError;
use crate::records::{
    NewPermission, NewRole, NewUser, PermissionRecord, PermissionUpdate, RoleRecord, RoleUpdate,
    UserRecord, UserUpdate,
};
use crate::traits::{AssignmentStore, PermissionStore, RoleStore, UserStore};

/// Postgres-backed store implementing every persistence seam.
///
/// `PgStore` is `Send + Sync`; the SQLx pool handles connection management
/// across concurrent workers.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await
            .map_err(|e| StoreError::Backend(format!("connect: {e}")))?;
        Ok(Self::new(pool))
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn role_from_row(row: &PgRow) -> Result<RoleRecord, sqlx::Error> {
    Ok(RoleRecord {
        id: RoleId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        display_name: row.try_get("display_name")?,
    })
}

fn permission_from_row(row: &PgRow) -> Result<PermissionRecord, sqlx::Error> {
    Ok(PermissionRecord {
        id: PermissionId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        display_name: row.try_get("display_name")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => StoreError::Conflict(db.message().to_string()),
            Some("23503") => StoreError::InvalidReference(db.message().to_string()),
            _ => StoreError::Backend(format!("{operation}: {err}")),
        },
        _ => StoreError::Backend(format!("{operation}: {err}")),
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self, new), fields(username = %new.username), err)]
    async fn insert(&self, new: NewUser) -> Result<UserRecord, StoreError> {
        let id = UserId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, display_name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.username)
        .bind(&new.display_name)
        .bind(&new.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.insert", e))?;

        Ok(UserRecord {
            id,
            username: new.username,
            display_name: new.display_name,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, password_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.get", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("users.get", e))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, password_hash, created_at, updated_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.get_by_username", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("users.get_by_username", e))
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, username, display_name, password_hash, created_at, updated_at \
             FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.list", e))?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("users.list", e))
    }

    #[instrument(skip(self, update), err)]
    async fn update(&self, id: UserId, update: UserUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                password_hash = COALESCE($3, password_hash),
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.display_name)
        .bind(update.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.update", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("users.delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleStore for PgStore {
    #[instrument(skip(self, new), fields(code = %new.code), err)]
    async fn insert(&self, new: NewRole) -> Result<RoleRecord, StoreError> {
        let id = RoleId::new();

        sqlx::query("INSERT INTO roles (id, code, display_name) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(&new.code)
            .bind(&new.display_name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("roles.insert", e))?;

        Ok(RoleRecord {
            id,
            code: new.code,
            display_name: new.display_name,
        })
    }

    async fn get(&self, id: RoleId) -> Result<Option<RoleRecord>, StoreError> {
        let row = sqlx::query("SELECT id, code, display_name FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("roles.get", e))?;

        row.as_ref()
            .map(role_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("roles.get", e))
    }

    async fn list(&self) -> Result<Vec<RoleRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, code, display_name FROM roles ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("roles.list", e))?;

        rows.iter()
            .map(role_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("roles.list", e))
    }

    #[instrument(skip(self, update), err)]
    async fn update(&self, id: RoleId, update: RoleUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET code = COALESCE($2, code),
                display_name = COALESCE($3, display_name)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.code)
        .bind(update.display_name)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("roles.update", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: RoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("roles.delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    #[instrument(skip(self, new), fields(code = %new.code), err)]
    async fn insert(&self, new: NewPermission) -> Result<PermissionRecord, StoreError> {
        let id = PermissionId::new();

        sqlx::query("INSERT INTO permissions (id, code, display_name) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(&new.code)
            .bind(&new.display_name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("permissions.insert", e))?;

        Ok(PermissionRecord {
            id,
            code: new.code,
            display_name: new.display_name,
        })
    }

    async fn get(&self, id: PermissionId) -> Result<Option<PermissionRecord>, StoreError> {
        let row = sqlx::query("SELECT id, code, display_name FROM permissions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("permissions.get", e))?;

        row.as_ref()
            .map(permission_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("permissions.get", e))
    }

    async fn list(&self) -> Result<Vec<PermissionRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, code, display_name FROM permissions ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("permissions.list", e))?;

        rows.iter()
            .map(permission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("permissions.list", e))
    }

    #[instrument(skip(self, update), err)]
    async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET code = COALESCE($2, code),
                display_name = COALESCE($3, display_name)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.code)
        .bind(update.display_name)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("permissions.update", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: PermissionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("permissions.delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    #[instrument(skip(self), err)]
    async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.as_uuid())
            .bind(role.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("assignments.assign_role", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn remove_role(&self, user: UserId, role: RoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user.as_uuid())
            .bind(role.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("assignments.remove_role", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn roles_of_user(&self, user: UserId) -> Result<Vec<RoleRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.code, r.display_name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.code
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("assignments.roles_of_user", e))?;

        rows.iter()
            .map(role_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("assignments.roles_of_user", e))
    }

    #[instrument(skip(self), err)]
    async fn grant_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
            .bind(role.as_uuid())
            .bind(permission.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("assignments.grant_permission", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn revoke_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role.as_uuid())
                .bind(permission.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("assignments.revoke_permission", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn permissions_of_role(&self, role: RoleId) -> Result<Vec<PermissionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.code, p.display_name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.code
            "#,
        )
        .bind(role.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("assignments.permissions_of_role", e))?;

        rows.iter()
            .map(permission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("assignments.permissions_of_role", e))
    }

    async fn permissions_of_user(&self, user: UserId) -> Result<Vec<PermissionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.id, p.code, p.display_name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            ORDER BY p.code
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("assignments.permissions_of_user", e))?;

        rows.iter()
            .map(permission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("assignments.permissions_of_user", e))
    }
}

#[async_trait]
impl GrantSource for PgStore {
    async fn role_codes(&self, user: UserId) -> anyhow::Result<HashSet<RoleCode>> {
        let rows = sqlx::query(
            "SELECT r.code FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(RoleCode::from(row.try_get::<String, _>("code")?)))
            .collect()
    }

    async fn permission_codes(&self, user: UserId) -> anyhow::Result<HashSet<PermissionCode>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.code
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(PermissionCode::from(row.try_get::<String, _>("code")?)))
            .collect()
    }
}
