//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User has no assigned {0}")]
    MissingAssignment(&'static str),

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token claims")]
    MalformedClaims,

    #[error("Token expired")]
    TokenExpired,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied. Insufficient role.")]
    RoleMismatch,

    #[error("Access denied. Incorrect jenis user.")]
    JenisUserMismatch,

    #[error("Invalid signing key")]
    InvalidSigningKey,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Machine-readable error category sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingAssignment(_) => "MISSING_ASSIGNMENT",
            AuthError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::MalformedClaims => "MALFORMED_CLAIMS",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::RoleMismatch => "ROLE_MISMATCH",
            AuthError::JenisUserMismatch => "JENIS_USER_MISMATCH",
            AuthError::InvalidSigningKey
            | AuthError::PasswordHash(_)
            | AuthError::Serialization(_)
            | AuthError::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::RoleMismatch | AuthError::JenisUserMismatch => StatusCode::FORBIDDEN,
            AuthError::InvalidSigningKey
            | AuthError::PasswordHash(_)
            | AuthError::Serialization(_)
            | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Auth internal error: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = axum::Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        for err in [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::MalformedClaims,
            AuthError::TokenExpired,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{err}");
        }
        assert_eq!(AuthError::RoleMismatch.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::JenisUserMismatch.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Store("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejection_codes_are_distinct() {
        let codes = [
            AuthError::MissingAuthHeader.code(),
            AuthError::InvalidAuthHeader.code(),
            AuthError::MalformedToken.code(),
            AuthError::InvalidSignature.code(),
            AuthError::MalformedClaims.code(),
            AuthError::TokenExpired.code(),
            AuthError::RoleMismatch.code(),
            AuthError::JenisUserMismatch.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = AuthError::Store("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "Internal error");
    }
}
