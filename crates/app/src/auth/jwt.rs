//! Bearer token issuance and verification.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::users::records::UserUuid;

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL: SignedDuration = SignedDuration::from_hours(24 * 30);

/// Registered claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User UUID.
    pub sub: Uuid,

    /// Expiry, seconds since the epoch.
    pub exp: i64,

    /// Issued at, seconds since the epoch.
    pub iat: i64,
}

impl Claims {
    #[must_use]
    pub fn user_uuid(&self) -> UserUuid {
        UserUuid::from_uuid(self.sub)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed or forged token")]
    Invalid(#[source] JwtError),

    #[error("failed to sign token")]
    Encode(#[source] JwtError),

    #[error("token lifetime out of range")]
    InvalidTtl(#[source] jiff::Error),
}

/// HS256 signer and verifier sharing one secret.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: SignedDuration,
}

impl JwtCodec {
    #[must_use]
    pub fn new(secret: &str, ttl: SignedDuration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Sign a token for `user`, valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error when the expiry overflows or signing fails.
    pub fn issue(&self, user: UserUuid, now: Timestamp) -> Result<String, TokenError> {
        let expires_at = now.checked_add(self.ttl).map_err(TokenError::InvalidTtl)?;

        let claims = Claims {
            sub: user.into_uuid(),
            exp: expires_at.as_second(),
            iat: now.as_second(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] for expired tokens and
    /// [`TokenError::Invalid`] for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(error),
            })
    }
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("secret", &"**redacted**")
            .field("ttl", &self.ttl)
            .finish()
    }
}
