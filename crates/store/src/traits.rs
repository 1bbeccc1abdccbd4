//! Persistence contracts consumed by the transport layer.
//!
//! Mutations that target a single row by id return `bool` for "a row was
//! affected", so handlers can answer 404 without a second read.

use async_trait::async_trait;

use warden_core::{PermissionId, RoleId, UserId};

use crate::error::StoreError;
use crate::records::{
    NewPermission, NewRole, NewUser, PermissionRecord, PermissionUpdate, RoleRecord, RoleUpdate,
    UserRecord, UserUpdate,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` on a duplicate username.
    async fn insert(&self, new: NewUser) -> Result<UserRecord, StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<bool, StoreError>;

    /// Delete a user; role assignments cascade.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Insert a new role. Fails with `Conflict` on a duplicate code.
    async fn insert(&self, new: NewRole) -> Result<RoleRecord, StoreError>;

    async fn get(&self, id: RoleId) -> Result<Option<RoleRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<RoleRecord>, StoreError>;

    async fn update(&self, id: RoleId, update: RoleUpdate) -> Result<bool, StoreError>;

    /// Delete a role; user assignments and permission grants cascade.
    async fn delete(&self, id: RoleId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Insert a new permission. Fails with `Conflict` on a duplicate code.
    async fn insert(&self, new: NewPermission) -> Result<PermissionRecord, StoreError>;

    async fn get(&self, id: PermissionId) -> Result<Option<PermissionRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<PermissionRecord>, StoreError>;

    async fn update(&self, id: PermissionId, update: PermissionUpdate)
    -> Result<bool, StoreError>;

    /// Delete a permission; role grants cascade.
    async fn delete(&self, id: PermissionId) -> Result<bool, StoreError>;
}

/// The two many-to-many relationships: user↔role and role↔permission.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Assign a role to a user. `Conflict` if already assigned,
    /// `InvalidReference` if either side does not exist.
    async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), StoreError>;

    /// Remove a role from a user; `false` if it was not assigned.
    async fn remove_role(&self, user: UserId, role: RoleId) -> Result<bool, StoreError>;

    async fn roles_of_user(&self, user: UserId) -> Result<Vec<RoleRecord>, StoreError>;

    /// Grant a permission to a role. `Conflict` if already granted,
    /// `InvalidReference` if either side does not exist.
    async fn grant_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), StoreError>;

    /// Revoke a permission from a role; `false` if it was not granted.
    async fn revoke_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<bool, StoreError>;

    async fn permissions_of_role(&self, role: RoleId) -> Result<Vec<PermissionRecord>, StoreError>;

    /// Permissions a user holds through its roles (the only derivation path:
    /// there are no direct user→permission grants).
    async fn permissions_of_user(&self, user: UserId) -> Result<Vec<PermissionRecord>, StoreError>;
}
