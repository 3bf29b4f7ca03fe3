//! JWT token generation and validation.
//!
//! Tokens are signed with RS256. The key pair is loaded once when the
//! service is built and never changes for the lifetime of the process.

use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::JwtConfig;

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Neither an inline key nor a key file was configured.
    #[error("{0} is not configured")]
    MissingKey(&'static str),

    /// The token lifetime does not fit in a timestamp.
    #[error("token expiry of {0} seconds is out of range")]
    InvalidExpiry(u64),

    /// The key could not be read or parsed.
    #[error("invalid {name}: {reason}")]
    InvalidKey {
        /// Which key failed.
        name: &'static str,
        /// Underlying failure.
        reason: String,
    },
}

/// Longest accepted token lifetime: one year.
pub const MAX_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_secs: i64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expires_in_secs", &self.expires_in_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a JWT service from PEM-encoded RSA keys.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` if either key cannot be parsed.
    /// Returns `JwtError::InvalidExpiry` if `expires_in_secs` is zero or
    /// longer than [`MAX_EXPIRY_SECS`].
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        expires_in_secs: u64,
    ) -> Result<Self, JwtError> {
        if expires_in_secs == 0 || expires_in_secs > MAX_EXPIRY_SECS {
            return Err(JwtError::InvalidExpiry(expires_in_secs));
        }

        let encoding_key =
            EncodingKey::from_rsa_pem(private_pem).map_err(|e| JwtError::InvalidKey {
                name: "JWT private key",
                reason: e.to_string(),
            })?;
        let decoding_key =
            DecodingKey::from_rsa_pem(public_pem).map_err(|e| JwtError::InvalidKey {
                name: "JWT public key",
                reason: e.to_string(),
            })?;

        Ok(Self {
            encoding_key,
            decoding_key,
            expires_in_secs: i64::try_from(expires_in_secs)
                .map_err(|_| JwtError::InvalidExpiry(expires_in_secs))?,
        })
    }

    /// Creates a JWT service from configuration, reading key files if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is missing, unreadable, or malformed.
    pub fn from_config(config: &JwtConfig) -> Result<Self, JwtError> {
        let private_pem = resolve_key(
            "JWT private key",
            config.private_key.as_deref(),
            config.private_key_path.as_deref(),
        )?;
        let public_pem = resolve_key(
            "JWT public key",
            config.public_key.as_deref(),
            config.public_key_path.as_deref(),
        )?;

        Self::from_pem(&private_pem, &public_pem, config.expiry_secs)
    }

    /// Generates a signed token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let expires_at = Duration::try_seconds(self.expires_in_secs)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| JwtError::EncodingError("token expiry out of range".to_string()))?;
        let claims = Claims::new(user_id, email, expires_at);

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed or the
    /// signature does not match.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::RS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Returns the token lifetime in seconds.
    #[must_use]
    pub const fn expires_in(&self) -> i64 {
        self.expires_in_secs
    }
}

fn resolve_key(
    name: &'static str,
    inline: Option<&str>,
    path: Option<&Path>,
) -> Result<Vec<u8>, JwtError> {
    if let Some(pem) = inline.filter(|pem| !pem.trim().is_empty()) {
        return Ok(pem.as_bytes().to_vec());
    }

    let path = path.ok_or(JwtError::MissingKey(name))?;
    std::fs::read(path).map_err(|e| JwtError::InvalidKey {
        name,
        reason: format!("{}: {e}", path.display()),
    })
}
