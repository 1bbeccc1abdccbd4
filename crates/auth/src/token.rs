//! HS256 bearer-token service.
//!
//! Tokens are stateless: minted at login, never persisted server-side, and
//! invalidated only by expiry. Signature verification happens here; the
//! expiry/window rules stay in [`crate::claims::validate_claims`] so the
//! failure taxonomy (`Invalid` vs `Expired`) is decided in exactly one place.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use warden_core::UserId;

use crate::claims::{Claims, ClaimsError, validate_claims};

/// Verification failure taxonomy for presented credentials.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, unsigned, or tampered credential.
    #[error("invalid credential")]
    Invalid,

    /// Structurally sound credential past its validity window.
    #[error("credential has expired")]
    Expired,
}

/// Failure while minting a credential. Kept separate from [`TokenError`]:
/// a signing failure is an infrastructure fault, not a verification verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to sign credential: {0}")]
pub struct SigningError(String);

/// A freshly minted credential plus its expiry, for login responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential verification contract consumed by the transport layer.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// HS256 implementation over a server-held shared secret.
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a signed credential asserting `subject`, valid for the configured
    /// TTL from `now`. Stateless: no side effects beyond construction.
    pub fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<IssuedToken, SigningError> {
        let claims = Claims {
            sub: subject,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SigningError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TokenVerifier for Hs256TokenService {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // The claims carry their own window; expiry is checked by
        // validate_claims against the caller-supplied clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        match validate_claims(&data.claims, now) {
            Ok(()) => Ok(data.claims),
            Err(ClaimsError::Expired) => Err(TokenError::Expired),
            Err(_) => Err(TokenError::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> Hs256TokenService {
        Hs256TokenService::new(secret.as_bytes(), Duration::seconds(3600))
    }

    #[test]
    fn issued_token_verifies_to_the_same_subject() {
        let svc = service("test-secret");
        let subject = UserId::new();
        let now = Utc::now();

        let issued = svc.issue(subject, now).unwrap();
        let claims = svc.verify(&issued.token, now).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn token_past_ttl_is_expired_never_valid() {
        let svc = service("test-secret");
        let now = Utc::now();
        let issued = svc.issue(UserId::new(), now).unwrap();

        let err = svc
            .verify(&issued.token, now + Duration::seconds(3601))
            .unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn token_signed_with_a_different_key_never_resolves() {
        let minting = service("key-one");
        let verifying = service("key-two");
        let now = Utc::now();

        let issued = minting.issue(UserId::new(), now).unwrap();
        let err = verifying.verify(&issued.token, now).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let svc = service("test-secret");
        let now = Utc::now();
        let issued = svc.issue(UserId::new(), now).unwrap();

        // Flip a character in the payload segment.
        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let payload = &mut parts[1];
        let replacement = if payload.starts_with('A') { "B" } else { "A" };
        payload.replace_range(0..1, replacement);
        let tampered = parts.join(".");

        assert_eq!(svc.verify(&tampered, now).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = service("test-secret");
        assert_eq!(
            svc.verify("not-a-token", Utc::now()).unwrap_err(),
            TokenError::Invalid
        );
    }
}
