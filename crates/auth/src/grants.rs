use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use warden_core::UserId;

use crate::{PermissionCode, RoleCode};

/// The effective grants an identity holds, derived per request from its role
/// assignments: the assigned role codes plus the union of permission codes
/// granted to those roles. Not cached across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSet {
    pub roles: HashSet<RoleCode>,
    pub permissions: HashSet<PermissionCode>,
}

impl GrantSet {
    pub fn new(
        roles: impl IntoIterator<Item = RoleCode>,
        permissions: impl IntoIterator<Item = PermissionCode>,
    ) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has_any_role<'a>(&self, required: impl IntoIterator<Item = &'a RoleCode>) -> bool {
        required.into_iter().any(|code| self.roles.contains(code))
    }

    pub fn has_any_permission<'a>(
        &self,
        required: impl IntoIterator<Item = &'a PermissionCode>,
    ) -> bool {
        required
            .into_iter()
            .any(|code| self.permissions.contains(code))
    }
}

/// External lookup contract for an identity's grants.
///
/// Implementations typically read the user↔role and role↔permission
/// relationships from a database; the decision engine itself never touches
/// persistence. Lookup failures are infrastructure faults and must not be
/// conflated with a deny decision.
#[async_trait]
pub trait GrantSource: Send + Sync {
    /// Role codes assigned to the user.
    async fn role_codes(&self, user: UserId) -> anyhow::Result<HashSet<RoleCode>>;

    /// Permission codes the user holds through its roles.
    async fn permission_codes(&self, user: UserId) -> anyhow::Result<HashSet<PermissionCode>>;

    /// Both lookups combined into the per-request grant set.
    async fn grant_set(&self, user: UserId) -> anyhow::Result<GrantSet> {
        Ok(GrantSet {
            roles: self.role_codes(user).await?,
            permissions: self.permission_codes(user).await?,
        })
    }
}
