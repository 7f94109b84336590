use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, models::User};

/// Claims
///
/// Payload of a bearer token. Signed with HS256 and checked on every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: i64,
    pub email: String,
    /// Role name at the time the token was issued ("admin", "author").
    pub role: String,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// The secret is missing or the signer rejected the claims.
    #[error("token signing failed: {0}")]
    Signing(String),
    /// Parse, signature, algorithm and expiry failures all collapse into this variant.
    #[error("invalid token")]
    InvalidToken,
}

/// TokenService
///
/// Issues and validates bearer tokens. Built once from `AppConfig` at startup and
/// shared through the application state; the secret is never re-read from the environment.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Result<Self, TokenError> {
        if config.jwt_secret.trim().is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }

        let secret = config.jwt_secret.as_bytes();

        // Pinning the algorithm list rejects tokens signed with anything but HS256.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Expiry is exact: no grace period past the configured lifetime.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::hours(config.token_ttl_hours),
        })
    }

    /// Issues a token for `user`, valid from now for the configured lifetime.
    pub fn issue_token(&self, user: &User) -> Result<String, TokenError> {
        self.issue_token_at(user, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_token_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature, algorithm and expiry, returning the decoded claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                    kind => tracing::debug!(?kind, "rejected token"),
                }
                Err(TokenError::InvalidToken)
            }
        }
    }
}
