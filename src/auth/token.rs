//! Session token signing and validation

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::models::Claims;

/// Only HMAC-SHA256 tokens are issued or accepted
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session signing secret is not configured")]
    MissingSecret,

    #[error("session expiry is out of the representable range")]
    ExpiryOutOfRange,

    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Bad signature, wrong algorithm, malformed or expired. Deliberately
    /// carries no detail.
    #[error("invalid token")]
    InvalidToken,
}

/// Issues and checks the stateless `auth_token` session credential
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<str>,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
        }
    }

    pub fn issue(&self, subject: &str, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp().max(0) as usize,
        };

        let token = encode(
            &Header::new(SESSION_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Returns the embedded subject when the token is authentic and unexpired.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::InvalidToken);
        }

        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims.sub)
        .map_err(|e| {
            debug!(error = %e, "Session token rejected");
            TokenError::InvalidToken
        })
    }
}
