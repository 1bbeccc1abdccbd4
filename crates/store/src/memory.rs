//! In-memory backend.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use warden_auth::{GrantSource, PermissionCode, RoleCode};
use warden_core::{PermissionId, RoleId, UserId};

use crate::error::StoreError;
use crate::records::{
    NewPermission, NewRole, NewUser, PermissionRecord, PermissionUpdate, RoleRecord, RoleUpdate,
    UserRecord, UserUpdate,
};
use crate::traits::{AssignmentStore, PermissionStore, RoleStore, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    roles: HashMap<RoleId, RoleRecord>,
    permissions: HashMap<PermissionId, PermissionRecord>,
    user_roles: HashSet<(UserId, RoleId)>,
    role_permissions: HashSet<(RoleId, PermissionId)>,
}

/// In-memory store implementing every persistence seam.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, new: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.write()?;

        if inner.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already taken",
                new.username
            )));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: UserId::new(),
            username: new.username,
            display_name: new.display_name,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<UserRecord> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let Some(record) = inner.users.get_mut(&id) else {
            return Ok(false);
        };

        if let Some(display_name) = update.display_name {
            record.display_name = display_name;
        }
        if let Some(password_hash) = update.password_hash {
            record.password_hash = password_hash;
        }
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let removed = inner.users.remove(&id).is_some();
        if removed {
            inner.user_roles.retain(|(user, _)| *user != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn insert(&self, new: NewRole) -> Result<RoleRecord, StoreError> {
        let mut inner = self.write()?;

        if inner.roles.values().any(|r| r.code == new.code) {
            return Err(StoreError::Conflict(format!(
                "role code '{}' already exists",
                new.code
            )));
        }

        let record = RoleRecord {
            id: RoleId::new(),
            code: new.code,
            display_name: new.display_name,
        };
        inner.roles.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: RoleId) -> Result<Option<RoleRecord>, StoreError> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<RoleRecord>, StoreError> {
        let mut roles: Vec<RoleRecord> = self.read()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(roles)
    }

    async fn update(&self, id: RoleId, update: RoleUpdate) -> Result<bool, StoreError> {
        let mut inner = self.write()?;

        if let Some(code) = &update.code {
            if inner.roles.values().any(|r| r.id != id && &r.code == code) {
                return Err(StoreError::Conflict(format!(
                    "role code '{code}' already exists"
                )));
            }
        }

        let Some(record) = inner.roles.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(code) = update.code {
            record.code = code;
        }
        if let Some(display_name) = update.display_name {
            record.display_name = display_name;
        }
        Ok(true)
    }

    async fn delete(&self, id: RoleId) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let removed = inner.roles.remove(&id).is_some();
        if removed {
            inner.user_roles.retain(|(_, role)| *role != id);
            inner.role_permissions.retain(|(role, _)| *role != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn insert(&self, new: NewPermission) -> Result<PermissionRecord, StoreError> {
        let mut inner = self.write()?;

        if inner.permissions.values().any(|p| p.code == new.code) {
            return Err(StoreError::Conflict(format!(
                "permission code '{}' already exists",
                new.code
            )));
        }

        let record = PermissionRecord {
            id: PermissionId::new(),
            code: new.code,
            display_name: new.display_name,
        };
        inner.permissions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: PermissionId) -> Result<Option<PermissionRecord>, StoreError> {
        Ok(self.read()?.permissions.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<PermissionRecord>, StoreError> {
        let mut permissions: Vec<PermissionRecord> =
            self.read()?.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(permissions)
    }

    async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> Result<bool, StoreError> {
        let mut inner = self.write()?;

        if let Some(code) = &update.code {
            if inner
                .permissions
                .values()
                .any(|p| p.id != id && &p.code == code)
            {
                return Err(StoreError::Conflict(format!(
                    "permission code '{code}' already exists"
                )));
            }
        }

        let Some(record) = inner.permissions.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(code) = update.code {
            record.code = code;
        }
        if let Some(display_name) = update.display_name {
            record.display_name = display_name;
        }
        Ok(true)
    }

    async fn delete(&self, id: PermissionId) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let removed = inner.permissions.remove(&id).is_some();
        if removed {
            inner
                .role_permissions
                .retain(|(_, permission)| *permission != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        if !inner.users.contains_key(&user) {
            return Err(StoreError::InvalidReference(format!("user {user}")));
        }
        if !inner.roles.contains_key(&role) {
            return Err(StoreError::InvalidReference(format!("role {role}")));
        }
        if !inner.user_roles.insert((user, role)) {
            return Err(StoreError::Conflict("role already assigned".to_string()));
        }
        Ok(())
    }

    async fn remove_role(&self, user: UserId, role: RoleId) -> Result<bool, StoreError> {
        Ok(self.write()?.user_roles.remove(&(user, role)))
    }

    async fn roles_of_user(&self, user: UserId) -> Result<Vec<RoleRecord>, StoreError> {
        let inner = self.read()?;
        let mut roles: Vec<RoleRecord> = inner
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user)
            .filter_map(|(_, r)| inner.roles.get(r).cloned())
            .collect();
        roles.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(roles)
    }

    async fn grant_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        if !inner.roles.contains_key(&role) {
            return Err(StoreError::InvalidReference(format!("role {role}")));
        }
        if !inner.permissions.contains_key(&permission) {
            return Err(StoreError::InvalidReference(format!(
                "permission {permission}"
            )));
        }
        if !inner.role_permissions.insert((role, permission)) {
            return Err(StoreError::Conflict("permission already granted".to_string()));
        }
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<bool, StoreError> {
        Ok(self.write()?.role_permissions.remove(&(role, permission)))
    }

    async fn permissions_of_role(&self, role: RoleId) -> Result<Vec<PermissionRecord>, StoreError> {
        let inner = self.read()?;
        let mut permissions: Vec<PermissionRecord> = inner
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role)
            .filter_map(|(_, p)| inner.permissions.get(p).cloned())
            .collect();
        permissions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(permissions)
    }

    async fn permissions_of_user(&self, user: UserId) -> Result<Vec<PermissionRecord>, StoreError> {
        let inner = self.read()?;
        let role_ids: HashSet<RoleId> = inner
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, r)| *r)
            .collect();

        let permission_ids: HashSet<PermissionId> = inner
            .role_permissions
            .iter()
            .filter(|(r, _)| role_ids.contains(r))
            .map(|(_, p)| *p)
            .collect();

        let mut permissions: Vec<PermissionRecord> = permission_ids
            .iter()
            .filter_map(|p| inner.permissions.get(p).cloned())
            .collect();
        permissions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(permissions)
    }
}

#[async_trait]
impl GrantSource for MemoryStore {
    async fn role_codes(&self, user: UserId) -> anyhow::Result<HashSet<RoleCode>> {
        let roles = AssignmentStore::roles_of_user(self, user).await?;
        Ok(roles.into_iter().map(|r| RoleCode::from(r.code)).collect())
    }

    async fn permission_codes(&self, user: UserId) -> anyhow::Result<HashSet<PermissionCode>> {
        let permissions = AssignmentStore::permissions_of_user(self, user).await?;
        Ok(permissions
            .into_iter()
            .map(|p| PermissionCode::from(p.code))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, UserRecord, RoleRecord, PermissionRecord) {
        let store = MemoryStore::new();

        let user = UserStore::insert(
            &store,
            NewUser {
                username: "alice".to_string(),
                display_name: "Alice".to_string(),
                password_hash: "phc".to_string(),
            },
        )
        .await
        .unwrap();

        let role = RoleStore::insert(
            &store,
            NewRole {
                code: "admin".to_string(),
                display_name: "Administrator".to_string(),
            },
        )
        .await
        .unwrap();

        let permission = PermissionStore::insert(
            &store,
            NewPermission {
                code: "user:delete".to_string(),
                display_name: "Delete users".to_string(),
            },
        )
        .await
        .unwrap();

        (store, user, role, permission)
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (store, _, _, _) = seeded().await;
        let err = UserStore::insert(
            &store,
            NewUser {
                username: "alice".to_string(),
                display_name: "Other Alice".to_string(),
                password_hash: "phc".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn grants_flow_through_role_assignments() {
        let (store, user, role, permission) = seeded().await;

        store.assign_role(user.id, role.id).await.unwrap();
        store.grant_permission(role.id, permission.id).await.unwrap();

        let grants = store.grant_set(user.id).await.unwrap();
        assert!(grants.roles.contains(&RoleCode::new("admin")));
        assert!(grants.permissions.contains(&PermissionCode::new("user:delete")));
    }

    #[tokio::test]
    async fn permissions_never_attach_directly_to_users() {
        let (store, user, role, permission) = seeded().await;

        // Permission granted to a role the user does not hold.
        store.grant_permission(role.id, permission.id).await.unwrap();

        let grants = store.grant_set(user.id).await.unwrap();
        assert!(grants.permissions.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_role_cascades_assignments_and_grants() {
        let (store, user, role, permission) = seeded().await;
        store.assign_role(user.id, role.id).await.unwrap();
        store.grant_permission(role.id, permission.id).await.unwrap();

        assert!(RoleStore::delete(&store, role.id).await.unwrap());

        let grants = store.grant_set(user.id).await.unwrap();
        assert!(grants.roles.is_empty());
        assert!(grants.permissions.is_empty());
        assert!(store.roles_of_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assigning_twice_conflicts() {
        let (store, user, role, _) = seeded().await;
        store.assign_role(user.id, role.id).await.unwrap();
        let err = store.assign_role(user.id, role.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn assigning_to_missing_user_is_invalid_reference() {
        let (store, _, role, _) = seeded().await;
        let err = store
            .assign_role(UserId::new(), role.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn update_reports_whether_a_row_was_touched() {
        let (store, user, _, _) = seeded().await;

        let touched = UserStore::update(
            &store,
            user.id,
            UserUpdate {
                display_name: Some("Alice Smith".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(touched);

        let untouched = UserStore::update(&store, UserId::new(), UserUpdate::default())
            .await
            .unwrap();
        assert!(!untouched);

        let fetched = UserStore::get(&store, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.display_name, "Alice Smith");
    }

    #[tokio::test]
    async fn revoking_an_absent_grant_reports_false() {
        let (store, _, role, permission) = seeded().await;
        assert!(!store.revoke_permission(role.id, permission.id).await.unwrap());
    }
}
