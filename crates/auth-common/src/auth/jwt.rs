//! JWT utilities for session tokens
//!
//! Tokens are HS256-signed and carry the subject's public fields next to the
//! standard `iat`, `exp` and `iss` claims.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;

/// JWT claims structure
///
/// `subject` is flattened, so a token for `{id, email, name}` decodes as a
/// single JSON object with those keys plus the signing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims<T> {
    #[serde(flatten)]
    pub subject: T,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl<T> Claims<T> {
    /// Drop the signing metadata and keep the subject
    pub fn into_subject(self) -> T {
        self.subject
    }
}

/// JWT service for signing and verifying tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expires_in: i64,
    leeway: u64,
    enforce_issuer: bool,
}

impl JwtService {
    /// Create a new JWT service with the given secret, issuer and lifetime in seconds
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>, expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            expires_in,
            leeway: 0,
            enforce_issuer: true,
        }
    }

    /// Create a JWT service from configuration
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret, config.issuer.clone(), config.expires_in).with_leeway(config.leeway)
    }

    /// Tolerate this many seconds of clock skew when checking `exp`
    #[must_use]
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Accept tokens regardless of their `iss` claim
    #[must_use]
    pub fn without_issuer_check(mut self) -> Self {
        self.enforce_issuer = false;
        self
    }

    /// Token lifetime in seconds
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Issuer stamped into every token
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a token over the given subject
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn sign<T: Serialize>(&self, subject: &T) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = TimeDelta::try_seconds(self.expires_in)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Token lifetime of {}s overflows the clock",
                    self.expires_in
                ))
            })?;

        let claims = Claims {
            subject,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))
    }

    /// Decode and validate a token
    ///
    /// # Errors
    /// Returns `TokenExpired`, `InvalidIssuer`, or `InvalidToken` for bad signatures
    /// and malformed input
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<Claims<T>, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        if self.enforce_issuer {
            validation.set_issuer(&[self.issuer.as_str()]);
        }

        let token_data = decode::<Claims<T>>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AppError::InvalidIssuer,
                _ => AppError::InvalidToken,
            }
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("expires_in", &self.expires_in)
            .field("leeway", &self.leeway)
            .field("enforce_issuer", &self.enforce_issuer)
            .finish_non_exhaustive()
    }
}
