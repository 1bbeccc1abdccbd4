//! Per-operation requirement declarations.
//!
//! Role and permission management are admin-only at the group level; user
//! management declares per-operation permissions, with create/delete also
//! demanding the admin role. Resolved once here, checked by
//! [`crate::authz::authorize_operation`] in every protected handler.

use warden_auth::{Requirement, RequirementCatalog};

/// Operation names, one per protected handler.
pub mod ops {
    pub const AUTH_ME: &str = "auth.me";

    pub const USER_LIST: &str = "user.list";
    pub const USER_DETAIL: &str = "user.detail";
    pub const USER_CREATE: &str = "user.create";
    pub const USER_UPDATE: &str = "user.update";
    pub const USER_DELETE: &str = "user.delete";

    pub const ROLE_LIST: &str = "role.list";
    pub const ROLE_CREATE: &str = "role.create";
    pub const ROLE_UPDATE: &str = "role.update";
    pub const ROLE_DELETE: &str = "role.delete";

    pub const PERMISSION_LIST: &str = "permission.list";
    pub const PERMISSION_CREATE: &str = "permission.create";
    pub const PERMISSION_UPDATE: &str = "permission.update";
    pub const PERMISSION_DELETE: &str = "permission.delete";

    pub const USER_ROLE_LIST: &str = "user_role.list";
    pub const USER_ROLE_ASSIGN: &str = "user_role.assign";
    pub const USER_ROLE_REMOVE: &str = "user_role.remove";
    pub const USER_PERMISSION_LIST: &str = "user_role.permissions";

    pub const ROLE_PERMISSION_LIST: &str = "role_permission.list";
    pub const ROLE_PERMISSION_GRANT: &str = "role_permission.grant";
    pub const ROLE_PERMISSION_REVOKE: &str = "role_permission.revoke";
}

/// Build the flat per-operation requirement table.
pub fn catalog() -> RequirementCatalog {
    RequirementCatalog::builder()
        // Any authenticated identity.
        .operation(ops::AUTH_ME, Requirement::none())
        // User management: per-operation declarations.
        .operation(ops::USER_LIST, Requirement::permission("user:view"))
        .operation(ops::USER_DETAIL, Requirement::permission("user:view"))
        .operation(
            ops::USER_CREATE,
            Requirement::permission("user:create").and_role("admin"),
        )
        .operation(ops::USER_UPDATE, Requirement::permission("user:update"))
        .operation(
            ops::USER_DELETE,
            Requirement::permission("user:delete").and_role("admin"),
        )
        // Role management: admin-only as a group.
        .group(Requirement::role("admin"))
        .operation(ops::ROLE_LIST, Requirement::none())
        .operation(ops::ROLE_CREATE, Requirement::none())
        .operation(ops::ROLE_UPDATE, Requirement::none())
        .operation(ops::ROLE_DELETE, Requirement::none())
        .done()
        // Permission management: admin-only as a group.
        .group(Requirement::role("admin"))
        .operation(ops::PERMISSION_LIST, Requirement::none())
        .operation(ops::PERMISSION_CREATE, Requirement::none())
        .operation(ops::PERMISSION_UPDATE, Requirement::none())
        .operation(ops::PERMISSION_DELETE, Requirement::none())
        .done()
        // Relationship management: admin-only as a group.
        .group(Requirement::role("admin"))
        .operation(ops::USER_ROLE_LIST, Requirement::none())
        .operation(ops::USER_ROLE_ASSIGN, Requirement::none())
        .operation(ops::USER_ROLE_REMOVE, Requirement::none())
        .operation(ops::USER_PERMISSION_LIST, Requirement::none())
        .operation(ops::ROLE_PERMISSION_LIST, Requirement::none())
        .operation(ops::ROLE_PERMISSION_GRANT, Requirement::none())
        .operation(ops::ROLE_PERMISSION_REVOKE, Requirement::none())
        .done()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_auth::RoleCode;

    #[test]
    fn every_declared_operation_is_registered() {
        let catalog = catalog();
        for op in [
            ops::AUTH_ME,
            ops::USER_LIST,
            ops::USER_DETAIL,
            ops::USER_CREATE,
            ops::USER_UPDATE,
            ops::USER_DELETE,
            ops::ROLE_LIST,
            ops::ROLE_CREATE,
            ops::ROLE_UPDATE,
            ops::ROLE_DELETE,
            ops::PERMISSION_LIST,
            ops::PERMISSION_CREATE,
            ops::PERMISSION_UPDATE,
            ops::PERMISSION_DELETE,
            ops::USER_ROLE_LIST,
            ops::USER_ROLE_ASSIGN,
            ops::USER_ROLE_REMOVE,
            ops::USER_PERMISSION_LIST,
            ops::ROLE_PERMISSION_LIST,
            ops::ROLE_PERMISSION_GRANT,
            ops::ROLE_PERMISSION_REVOKE,
        ] {
            assert!(catalog.requirement_of(op).is_some(), "missing {op}");
        }
    }

    #[test]
    fn profile_endpoint_only_needs_authentication() {
        let catalog = catalog();
        assert!(catalog.requirement_of(ops::AUTH_ME).unwrap().is_unconstrained());
    }

    #[test]
    fn group_level_admin_applies_to_role_management() {
        let catalog = catalog();
        let req = catalog.requirement_of(ops::ROLE_LIST).unwrap();
        assert!(req.required_roles().contains(&RoleCode::new("admin")));
    }

    #[test]
    fn user_create_demands_both_kinds() {
        let catalog = catalog();
        let req = catalog.requirement_of(ops::USER_CREATE).unwrap();
        assert!(!req.required_roles().is_empty());
        assert!(!req.required_permissions().is_empty());
    }
}
