//! `warden-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: credential
//! verification depends only on the signing secret and the input text, and
//! the decision engine depends only on an already-loaded grant set.

pub mod authorize;
pub mod claims;
pub mod grants;
pub mod password;
pub mod permissions;
pub mod requirement;
pub mod roles;
pub mod token;

pub use authorize::{AccessError, AuthzError, authorize};
pub use claims::{Claims, ClaimsError, validate_claims};
pub use grants::{GrantSet, GrantSource};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::PermissionCode;
pub use requirement::{CatalogBuilder, Requirement, RequirementCatalog};
pub use roles::RoleCode;
pub use token::{Hs256TokenService, IssuedToken, SigningError, TokenError, TokenVerifier};
