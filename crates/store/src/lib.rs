//! `warden-store` — persistence seams and backends.
//!
//! The API layer talks to the trait objects in [`traits`]; two backends are
//! provided: an in-memory store for tests/dev and a Postgres store for
//! production. Both also implement the auth crate's `GrantSource` lookup
//! contract.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use records::{
    NewPermission, NewRole, NewUser, PermissionRecord, PermissionUpdate, RoleRecord, RoleUpdate,
    UserRecord, UserUpdate,
};
pub use traits::{AssignmentStore, PermissionStore, RoleStore, UserStore};
