use warden_auth::GrantSet;
use warden_core::UserId;

/// Principal context for a request (authenticated identity + effective
/// grants). Immutable once resolved; loaded fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    grants: GrantSet,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, grants: GrantSet) -> Self {
        Self { user_id, grants }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn grants(&self) -> &GrantSet {
        &self.grants
    }
}
