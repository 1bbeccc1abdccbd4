use thiserror::Error;

use crate::grants::GrantSet;
use crate::requirement::Requirement;
use crate::token::TokenError;

/// Authorization denial: the identity is known but the requirement is not met.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("missing required role (any of: {0})")]
    InsufficientRole(String),

    #[error("missing required permission (any of: {0})")]
    InsufficientPermission(String),
}

/// Full failure taxonomy for the authorization pipeline. The wire response is
/// uniform, but logs/audit keep the kinds distinguishable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("no credential presented")]
    MissingCredential,

    #[error("credential rejected: {0}")]
    Unauthenticated(#[source] TokenError),

    #[error(transparent)]
    Denied(#[from] AuthzError),
}

/// Authorize a set of effective grants against an operation requirement.
///
/// - No IO
/// - No panics
/// - Deterministic: same inputs, same answer
///
/// The role clause is evaluated before the permission clause; within each
/// clause any one listed code suffices, and an empty clause imposes nothing.
pub fn authorize(grants: &GrantSet, requirement: &Requirement) -> Result<(), AuthzError> {
    let required_roles = requirement.required_roles();
    if !required_roles.is_empty() && !grants.has_any_role(required_roles) {
        return Err(AuthzError::InsufficientRole(render(
            required_roles.iter().map(|c| c.as_str()),
        )));
    }

    let required_permissions = requirement.required_permissions();
    if !required_permissions.is_empty() && !grants.has_any_permission(required_permissions) {
        return Err(AuthzError::InsufficientPermission(render(
            required_permissions.iter().map(|c| c.as_str()),
        )));
    }

    Ok(())
}

/// Sorted rendering so error text is stable regardless of set iteration order.
fn render<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    let mut codes: Vec<&str> = codes.collect();
    codes.sort_unstable();
    codes.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PermissionCode, RoleCode};
    use proptest::prelude::*;

    fn grants(roles: &[&'static str], permissions: &[&'static str]) -> GrantSet {
        GrantSet::new(
            roles.iter().copied().map(RoleCode::new),
            permissions.iter().copied().map(PermissionCode::new),
        )
    }

    #[test]
    fn empty_requirement_allows_any_authenticated_identity() {
        assert_eq!(authorize(&grants(&[], &[]), &Requirement::none()), Ok(()));
        assert_eq!(
            authorize(&grants(&["viewer"], &["user:view"]), &Requirement::none()),
            Ok(())
        );
    }

    #[test]
    fn role_grants_permission_scenario() {
        // Role `admin` grants permission `user:delete`.
        let u1 = grants(&["admin"], &["user:delete"]);
        let u2 = grants(&["viewer"], &[]);
        let requirement = Requirement::permission("user:delete");

        assert_eq!(authorize(&u1, &requirement), Ok(()));
        assert!(matches!(
            authorize(&u2, &requirement),
            Err(AuthzError::InsufficientPermission(_))
        ));
    }

    #[test]
    fn role_requirement_scenario() {
        let requirement = Requirement::role("admin");
        let u1 = grants(&["admin"], &[]);
        let u2 = grants(&["viewer"], &[]);

        assert_eq!(authorize(&u1, &requirement), Ok(()));
        assert!(matches!(
            authorize(&u2, &requirement),
            Err(AuthzError::InsufficientRole(_))
        ));
    }

    #[test]
    fn disjoint_roles_deny_regardless_of_permissions() {
        let requirement = Requirement::role("admin").and_permission("user:view");
        // Identity holds the permission but not the role: the role clause is
        // checked first and wins.
        let subject = grants(&["viewer"], &["user:view"]);

        assert!(matches!(
            authorize(&subject, &requirement),
            Err(AuthzError::InsufficientRole(_))
        ));
    }

    #[test]
    fn any_single_listed_code_satisfies_its_clause() {
        let requirement = Requirement::role("admin").and_role("operator");
        let subject = grants(&["operator"], &[]);
        assert_eq!(authorize(&subject, &requirement), Ok(()));
    }

    #[test]
    fn both_kinds_demand_a_match_from_each() {
        let requirement = Requirement::role("admin").and_permission("user:create");

        assert_eq!(
            authorize(&grants(&["admin"], &["user:create"]), &requirement),
            Ok(())
        );
        assert!(matches!(
            authorize(&grants(&["admin"], &[]), &requirement),
            Err(AuthzError::InsufficientPermission(_))
        ));
        assert!(matches!(
            authorize(&grants(&[], &["user:create"]), &requirement),
            Err(AuthzError::InsufficientRole(_))
        ));
    }

    #[test]
    fn denial_message_lists_missing_codes_sorted() {
        let requirement = Requirement::role("operator").and_role("admin");
        let err = authorize(&grants(&[], &[]), &requirement).unwrap_err();
        assert_eq!(
            err,
            AuthzError::InsufficientRole("admin, operator".to_string())
        );
    }

    proptest! {
        /// Calling authorize twice with identical inputs yields identical
        /// results (no hidden state).
        #[test]
        fn authorize_is_idempotent(
            held_roles in prop::collection::hash_set("[a-z]{1,8}", 0..6),
            held_perms in prop::collection::hash_set("[a-z]{1,8}:[a-z]{1,8}", 0..6),
            req_roles in prop::collection::hash_set("[a-z]{1,8}", 0..4),
            req_perms in prop::collection::hash_set("[a-z]{1,8}:[a-z]{1,8}", 0..4),
        ) {
            let subject = GrantSet::new(
                held_roles.iter().cloned().map(RoleCode::from),
                held_perms.iter().cloned().map(PermissionCode::from),
            );
            let mut requirement = Requirement::none();
            for code in &req_roles {
                requirement = requirement.and_role(code.clone());
            }
            for code in &req_perms {
                requirement = requirement.and_permission(code.clone());
            }

            let first = authorize(&subject, &requirement);
            let second = authorize(&subject, &requirement);
            prop_assert_eq!(first, second);
        }

        /// A requirement is satisfied iff (role clause empty or
        /// intersecting) and (permission clause empty or intersecting).
        #[test]
        fn decision_matches_set_intersection_semantics(
            held_roles in prop::collection::hash_set("[a-z]{1,8}", 0..6),
            held_perms in prop::collection::hash_set("[a-z]{1,8}", 0..6),
            req_roles in prop::collection::hash_set("[a-z]{1,8}", 0..4),
            req_perms in prop::collection::hash_set("[a-z]{1,8}", 0..4),
        ) {
            let subject = GrantSet::new(
                held_roles.iter().cloned().map(RoleCode::from),
                held_perms.iter().cloned().map(PermissionCode::from),
            );
            let mut requirement = Requirement::none();
            for code in &req_roles {
                requirement = requirement.and_role(code.clone());
            }
            for code in &req_perms {
                requirement = requirement.and_permission(code.clone());
            }

            let role_ok = req_roles.is_empty()
                || req_roles.iter().any(|c| held_roles.contains(c));
            let perm_ok = req_perms.is_empty()
                || req_perms.iter().any(|c| held_perms.contains(c));

            let decision = authorize(&subject, &requirement);
            prop_assert_eq!(decision.is_ok(), role_ok && perm_ok);

            if !role_ok {
                prop_assert!(matches!(
                    decision,
                    Err(AuthzError::InsufficientRole(_))
                ));
            } else if !perm_ok {
                prop_assert!(matches!(
                    decision,
                    Err(AuthzError::InsufficientPermission(_))
                ));
            }
        }
    }
}
