//! Static requirement declarations for protected operations.
//!
//! A [`Requirement`] names the role codes and/or permission codes an operation
//! demands. Declarations compose at two granularities: a group-level base
//! shared by a family of operations, and a per-operation extra. The
//! [`CatalogBuilder`] resolves both levels into one flat per-operation table
//! at registration time, so the decision engine sees a single requirement and
//! nothing is recomputed per request.

use std::collections::{HashMap, HashSet};

use crate::{PermissionCode, RoleCode};

/// The declared role/permission codes an operation demands.
///
/// Both sets may be empty; an entirely empty requirement means "any
/// authenticated identity". Satisfying any one listed role satisfies the role
/// clause (likewise for permissions); a requirement naming both kinds demands
/// at least one match from each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    roles: HashSet<RoleCode>,
    permissions: HashSet<PermissionCode>,
}

impl Requirement {
    /// No constraint beyond authentication.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn role(code: impl Into<RoleCode>) -> Self {
        Self::none().and_role(code)
    }

    pub fn permission(code: impl Into<PermissionCode>) -> Self {
        Self::none().and_permission(code)
    }

    pub fn and_role(mut self, code: impl Into<RoleCode>) -> Self {
        self.roles.insert(code.into());
        self
    }

    pub fn and_permission(mut self, code: impl Into<PermissionCode>) -> Self {
        self.permissions.insert(code.into());
        self
    }

    /// Union of both declaration levels (the composition rule for
    /// group-level ∪ operation-level).
    pub fn union(&self, other: &Requirement) -> Requirement {
        Requirement {
            roles: self.roles.union(&other.roles).cloned().collect(),
            permissions: self
                .permissions
                .union(&other.permissions)
                .cloned()
                .collect(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }

    pub fn required_roles(&self) -> &HashSet<RoleCode> {
        &self.roles
    }

    pub fn required_permissions(&self) -> &HashSet<PermissionCode> {
        &self.permissions
    }
}

/// Flat per-operation requirement table, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct RequirementCatalog {
    operations: HashMap<&'static str, Requirement>,
}

impl RequirementCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The resolved requirement for a registered operation.
    pub fn requirement_of(&self, operation: &str) -> Option<&Requirement> {
        self.operations.get(operation)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Builder collecting group- and operation-level declarations.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    operations: HashMap<&'static str, Requirement>,
}

impl CatalogBuilder {
    /// Declare a single operation with its full requirement.
    pub fn operation(mut self, name: &'static str, requirement: Requirement) -> Self {
        self.insert(name, requirement);
        self
    }

    /// Open a group whose base requirement applies to every operation
    /// declared within it.
    pub fn group(self, base: Requirement) -> GroupBuilder {
        GroupBuilder {
            catalog: self,
            base,
        }
    }

    pub fn build(self) -> RequirementCatalog {
        RequirementCatalog {
            operations: self.operations,
        }
    }

    fn insert(&mut self, name: &'static str, requirement: Requirement) {
        // Repeated declarations for one operation compose by union, same as
        // the group/operation levels do.
        self.operations
            .entry(name)
            .and_modify(|existing| *existing = existing.union(&requirement))
            .or_insert(requirement);
    }
}

/// Scoped builder for operations sharing a group-level base requirement.
#[derive(Debug)]
pub struct GroupBuilder {
    catalog: CatalogBuilder,
    base: Requirement,
}

impl GroupBuilder {
    /// Declare an operation inside the group; its effective requirement is
    /// the union of the group base and `extra`.
    pub fn operation(mut self, name: &'static str, extra: Requirement) -> Self {
        let resolved = self.base.union(&extra);
        self.catalog.insert(name, resolved);
        self
    }

    /// Close the group and continue declaring at the top level.
    pub fn done(self) -> CatalogBuilder {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_requirement_is_unconstrained() {
        assert!(Requirement::none().is_unconstrained());
        assert!(!Requirement::role("admin").is_unconstrained());
    }

    #[test]
    fn union_merges_both_kinds() {
        let group = Requirement::role("admin");
        let op = Requirement::permission("user:create");
        let resolved = group.union(&op);

        assert!(resolved.required_roles().contains(&RoleCode::new("admin")));
        assert!(
            resolved
                .required_permissions()
                .contains(&PermissionCode::new("user:create"))
        );
    }

    #[test]
    fn group_base_applies_to_every_member_operation() {
        let catalog = RequirementCatalog::builder()
            .group(Requirement::role("admin"))
            .operation("role.list", Requirement::none())
            .operation("role.create", Requirement::permission("role:create"))
            .done()
            .build();

        let list = catalog.requirement_of("role.list").unwrap();
        assert!(list.required_roles().contains(&RoleCode::new("admin")));
        assert!(list.required_permissions().is_empty());

        let create = catalog.requirement_of("role.create").unwrap();
        assert!(create.required_roles().contains(&RoleCode::new("admin")));
        assert!(
            create
                .required_permissions()
                .contains(&PermissionCode::new("role:create"))
        );
    }

    #[test]
    fn top_level_operations_carry_only_their_own_requirement() {
        let catalog = RequirementCatalog::builder()
            .operation("user.list", Requirement::permission("user:view"))
            .build();

        let req = catalog.requirement_of("user.list").unwrap();
        assert!(req.required_roles().is_empty());
        assert_eq!(req.required_permissions().len(), 1);
    }

    #[test]
    fn duplicate_declarations_compose_by_union() {
        let catalog = RequirementCatalog::builder()
            .operation("user.delete", Requirement::permission("user:delete"))
            .operation("user.delete", Requirement::role("admin"))
            .build();

        let req = catalog.requirement_of("user.delete").unwrap();
        assert!(req.required_roles().contains(&RoleCode::new("admin")));
        assert!(
            req.required_permissions()
                .contains(&PermissionCode::new("user:delete"))
        );
    }

    #[test]
    fn unregistered_operation_is_absent() {
        let catalog = RequirementCatalog::builder().build();
        assert!(catalog.requirement_of("nope").is_none());
    }
}
