use thiserror::Error;

/// Persistence-layer error.
///
/// Deterministic data outcomes (conflicts, dangling references) are separated
/// from backend faults so the transport layer can keep infrastructure
/// failures distinct from authorization or validation rejections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (duplicate username/code, or a
    /// relationship that already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist (e.g. assigning a role to a missing
    /// user).
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The backend itself failed (connection loss, lock poisoning, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
