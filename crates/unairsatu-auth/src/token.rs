//! Signed bearer token issuance and verification
//!
//! Wire format:
//!
//! ```text
//! base64url(header_json) "." base64url(claims_json) "." base64url(hmac_sha256)
//! ```
//!
//! The header is always `{"alg":"HS256","typ":"TOKEN"}`. Segments use the
//! URL-safe alphabet with `=` padding. The signature covers the two encoded
//! segments joined by `.`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use tracing::debug;
use unairsatu_db::ObjectId;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm named in every header
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Token type named in every header
pub const TOKEN_TYPE: &str = "TOKEN";

/// Fixed token lifetime in seconds
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

const SEGMENT_DELIMITER: char = '.';

/// Token header
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Identity claims carried by a token.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Jenis user (category) reference
    pub jenis_user_id: ObjectId,
    /// Role reference
    pub role_id: ObjectId,
    /// Subject name
    pub username: String,
}

impl Claims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Issues and verifies tokens with a single HMAC key
#[derive(Clone)]
pub struct TokenManager {
    mac: HmacSha256,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager keyed with `secret`
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSigningKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| AuthError::InvalidSigningKey)?;
        Ok(Self { mac })
    }

    /// Lifetime of every issued token
    pub fn lifetime() -> Duration {
        Duration::seconds(TOKEN_LIFETIME_SECS)
    }

    /// Issue a token valid for one hour from now
    pub fn issue(
        &self,
        username: &str,
        role_id: ObjectId,
        jenis_user_id: ObjectId,
    ) -> Result<String, AuthError> {
        self.issue_at(username, role_id, jenis_user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        username: &str,
        role_id: ObjectId,
        jenis_user_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (now + Self::lifetime()).timestamp(),
            jenis_user_id,
            role_id,
            username: username.to_string(),
        };

        debug!("Issuing token for user: {}", username);

        let header = URL_SAFE.encode(serde_json::to_vec(&TokenHeader::default())?);
        let payload = URL_SAFE.encode(serde_json::to_vec(&claims)?);
        Ok(self.seal(&header, &payload))
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The signature is checked before any segment is decoded, so nothing in
    /// an unsigned payload is ever trusted.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut segments = token.split(SEGMENT_DELIMITER);
        let (header, payload, signature) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                (h, p, s)
            }
            _ => return Err(AuthError::MalformedToken),
        };

        let supplied = URL_SAFE
            .decode(signature)
            .map_err(|_| AuthError::InvalidSignature)?;
        self.sign(header, payload)
            .verify_slice(&supplied)
            .map_err(|_| AuthError::InvalidSignature)?;

        let header: TokenHeader = URL_SAFE
            .decode(header)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::MalformedToken)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(AuthError::MalformedToken);
        }

        let claims: Claims = URL_SAFE
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::MalformedClaims)?;
        if claims.username.is_empty() {
            return Err(AuthError::MalformedClaims);
        }

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    fn sign(&self, header: &str, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac
    }

    fn seal(&self, header: &str, payload: &str) -> String {
        let signature = URL_SAFE.encode(self.sign(header, payload).finalize().into_bytes());
        format!("{header}.{payload}.{signature}")
    }
}
