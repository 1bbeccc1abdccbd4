use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::UserId;

/// Credential claims model (transport-agnostic).
///
/// This is the minimal set of claims warden embeds in a bearer token once it
/// has been decoded/verified by the token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("credential has expired")]
    Expired,

    #[error("credential not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid validity window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate credential claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// lives in the token service.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), ClaimsError> {
    if claims.expires_at <= claims.issued_at {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(ClaimsError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(issued_at: DateTime<Utc>, ttl_secs: i64) -> Claims {
        Claims {
            sub: UserId::new(),
            issued_at,
            expires_at: issued_at + Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn claims_within_window_are_valid() {
        let now = Utc::now();
        let claims = claims_at(now, 3600);
        assert_eq!(validate_claims(&claims, now + Duration::seconds(10)), Ok(()));
    }

    #[test]
    fn claims_past_expiry_are_expired() {
        // Issued at T with TTL 3600s, checked at T+3601s.
        let issued = Utc::now();
        let claims = claims_at(issued, 3600);
        assert_eq!(
            validate_claims(&claims, issued + Duration::seconds(3601)),
            Err(ClaimsError::Expired)
        );
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let issued = Utc::now();
        let claims = claims_at(issued, 3600);
        assert_eq!(
            validate_claims(&claims, issued + Duration::seconds(3600)),
            Err(ClaimsError::Expired)
        );
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::seconds(60), 3600);
        assert_eq!(validate_claims(&claims, now), Err(ClaimsError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: UserId::new(),
            issued_at: now,
            expires_at: now - Duration::seconds(1),
        };
        assert_eq!(
            validate_claims(&claims, now),
            Err(ClaimsError::InvalidTimeWindow)
        );
    }
}
