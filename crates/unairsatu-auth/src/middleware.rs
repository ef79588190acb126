//! Access gate middleware for Axum
//!
//! Protected route groups run three stages in a fixed order:
//!
//! 1. [`authenticate`] verifies the bearer token and stores an [`AuthContext`]
//!    in the request extensions.
//! 2. [`require_role`] compares the context's role with a [`RequiredRole`].
//! 3. [`require_jenis_user`] compares the context's jenis user with a
//!    [`RequiredJenisUser`].
//!
//! Any stage may short-circuit with an [`AuthError`]. Handlers read the
//! context through the [`AuthContext`] extractor.

use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use unairsatu_db::ObjectId;

use crate::error::AuthError;
use crate::token::{Claims, TokenManager};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated identity for the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub username: String,
    pub role_id: ObjectId,
    pub jenis_user_id: ObjectId,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            role_id: claims.role_id,
            jenis_user_id: claims.jenis_user_id,
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Role a route group requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRole(pub ObjectId);

/// Jenis user a route group requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredJenisUser(pub ObjectId);

/// Requirements enforced on a protected route group.
///
/// Authentication always runs; each authorization stage is attached only
/// when its requirement is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    pub role: Option<RequiredRole>,
    pub jenis_user: Option<RequiredJenisUser>,
}

impl AccessPolicy {
    pub fn new(role_id: ObjectId, jenis_user_id: ObjectId) -> Self {
        Self {
            role: Some(RequiredRole(role_id)),
            jenis_user: Some(RequiredJenisUser(jenis_user_id)),
        }
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidAuthHeader)
}

fn reject(stage: &'static str, err: AuthError) -> AuthError {
    warn!(stage, code = err.code(), "Request rejected: {}", err);
    metrics::counter!("unairsatu_auth_rejections_total", "code" => err.code()).increment(1);
    err
}

/// Authentication stage
pub async fn authenticate(
    State(tokens): State<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match request.headers().get(AUTHORIZATION) {
        None => return Err(reject("authenticate", AuthError::MissingAuthHeader)),
        Some(value) if value.is_empty() => {
            return Err(reject("authenticate", AuthError::MissingAuthHeader));
        }
        Some(value) => value
            .to_str()
            .map_err(|_| reject("authenticate", AuthError::InvalidAuthHeader))?,
    };

    let token = extract_bearer_token(header).map_err(|e| reject("authenticate", e))?;
    let claims = tokens
        .verify(token)
        .map_err(|e| reject("authenticate", e))?;
    let context = AuthContext::from(claims);

    debug!("Authenticated user: {}", context.username);

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Role stage
pub async fn require_role(
    State(RequiredRole(required)): State<RequiredRole>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| reject("role", AuthError::Unauthenticated))?;

    if context.role_id != required {
        debug!("User {} has role {}, route requires {}", context.username, context.role_id, required);
        return Err(reject("role", AuthError::RoleMismatch));
    }

    Ok(next.run(request).await)
}

/// Jenis user stage
pub async fn require_jenis_user(
    State(RequiredJenisUser(required)): State<RequiredJenisUser>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| reject("jenis_user", AuthError::Unauthenticated))?;

    if context.jenis_user_id != required {
        debug!(
            "User {} has jenis user {}, route requires {}",
            context.username, context.jenis_user_id, required
        );
        return Err(reject("jenis_user", AuthError::JenisUserMismatch));
    }

    Ok(next.run(request).await)
}

/// Wrap every route of `router` in the access gate.
///
/// Layers added later run earlier, so the stages are attached in reverse.
pub fn protect<S>(router: Router<S>, tokens: Arc<TokenManager>, policy: AccessPolicy) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = router;
    if let Some(required) = policy.jenis_user {
        router = router.route_layer(from_fn_with_state(required, require_jenis_user));
    }
    if let Some(required) = policy.role {
        router = router.route_layer(from_fn_with_state(required, require_role));
    }
    router.route_layer(from_fn_with_state(tokens, authenticate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"gate-test-secret";

    fn admin_role() -> ObjectId {
        ObjectId::parse_str("675d1cd023322aa0cdbdfdbd").unwrap()
    }

    fn staff_role() -> ObjectId {
        ObjectId::parse_str("675d1cd023322aa0cdbdfd01").unwrap()
    }

    fn dosen() -> ObjectId {
        ObjectId::parse_str("675d1d0e23322aa0cdbdfdbe").unwrap()
    }

    fn mahasiswa() -> ObjectId {
        ObjectId::parse_str("675d1d0e23322aa0cdbdfd02").unwrap()
    }

    fn tokens() -> Arc<TokenManager> {
        Arc::new(TokenManager::new(SECRET).unwrap())
    }

    fn gated_router(policy: AccessPolicy, hits: Arc<AtomicUsize>) -> Router {
        let router = Router::new().route(
            "/whoami",
            get(move |context: AuthContext| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    axum::Json(context)
                }
            }),
        );
        protect(router, tokens(), policy)
    }

    async fn call(router: Router, authorization: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    /// Correctly signed token carrying arbitrary claims JSON
    fn signed_with_claims(claims: &str) -> String {
        use base64::{Engine as _, engine::general_purpose::URL_SAFE};
        use hmac::{Hmac, Mac};

        let header = URL_SAFE.encode(br#"{"alg":"HS256","typ":"TOKEN"}"#);
        let payload = URL_SAFE.encode(claims.as_bytes());
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(SECRET).unwrap();
        mac.update(format!("{header}.{payload}").as_bytes());
        let signature = URL_SAFE.encode(mac.finalize().into_bytes());
        format!("{header}.{payload}.{signature}")
    }

    fn bearer(role: ObjectId, jenis: ObjectId) -> String {
        format!("Bearer {}", tokens().issue("alice", role, jenis).unwrap())
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(matches!(
            extract_bearer_token("Basic abc"),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            extract_bearer_token("bearer abc"),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[tokio::test]
    async fn test_passes_context_to_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = gated_router(AccessPolicy::new(admin_role(), dosen()), hits.clone());

        let (status, body) = call(router, Some(bearer(admin_role(), dosen()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role_id"], admin_role().to_hex());
        assert_eq!(body["jenis_user_id"], dosen().to_hex());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authentication_failures_are_distinct() {
        let policy = AccessPolicy::new(admin_role(), dosen());
        let foreign = TokenManager::new(b"some-other-key")
            .unwrap()
            .issue("alice", admin_role(), dosen())
            .unwrap();
        let expired = tokens()
            .issue_at("alice", admin_role(), dosen(), Utc::now() - Duration::hours(2))
            .unwrap();
        let bad_claims = signed_with_claims(
            r#"{"exp":4102444800,"jenis_user_id":"not-hex","role_id":"675d1cd023322aa0cdbdfdbd","username":"alice"}"#,
        );

        let cases = [
            (None, "MISSING_AUTH_HEADER"),
            (Some(String::new()), "MISSING_AUTH_HEADER"),
            (Some("Token abc.def.ghi".to_string()), "INVALID_AUTH_HEADER"),
            (Some("Bearer abc.def".to_string()), "MALFORMED_TOKEN"),
            (Some("Bearer ".to_string()), "MALFORMED_TOKEN"),
            (Some(format!("Bearer {foreign}")), "INVALID_SIGNATURE"),
            (Some(format!("Bearer {expired}")), "TOKEN_EXPIRED"),
            (Some(format!("Bearer {bad_claims}")), "MALFORMED_CLAIMS"),
        ];

        for (header, code) in cases {
            let hits = Arc::new(AtomicUsize::new(0));
            let (status, body) = call(gated_router(policy, hits.clone()), header.clone()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{header:?}");
            assert_eq!(body["code"], code, "{header:?}");
            assert_eq!(hits.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_before_authorization() {
        // Claims would satisfy the policy, but the signature is foreign
        let foreign = TokenManager::new(b"some-other-key")
            .unwrap()
            .issue("alice", staff_role(), mahasiswa())
            .unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let router = gated_router(AccessPolicy::new(staff_role(), mahasiswa()), hits.clone());

        let (status, body) = call(router, Some(format!("Bearer {foreign}"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_SIGNATURE");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_role_mismatch_is_forbidden() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = gated_router(AccessPolicy::new(admin_role(), dosen()), hits.clone());

        let (status, body) = call(router, Some(bearer(staff_role(), dosen()))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ROLE_MISMATCH");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_role_and_jenis_user_are_independent() {
        let policy = AccessPolicy::new(admin_role(), dosen());

        let hits = Arc::new(AtomicUsize::new(0));
        let (status, body) = call(
            gated_router(policy, hits.clone()),
            Some(bearer(admin_role(), mahasiswa())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "JENIS_USER_MISMATCH");

        let (status, body) = call(
            gated_router(policy, hits.clone()),
            Some(bearer(staff_role(), dosen())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ROLE_MISMATCH");

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stages_attach_independently() {
        let role_only = AccessPolicy {
            role: Some(RequiredRole(admin_role())),
            jenis_user: None,
        };
        let hits = Arc::new(AtomicUsize::new(0));
        let (status, _) = call(
            gated_router(role_only, hits.clone()),
            Some(bearer(admin_role(), mahasiswa())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let authenticate_only = AccessPolicy::default();
        let (status, _) = call(
            gated_router(authenticate_only, hits.clone()),
            Some(bearer(staff_role(), mahasiswa())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let (status, body) = call(gated_router(authenticate_only, hits.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_AUTH_HEADER");
    }

    #[tokio::test]
    async fn test_context_extractor_without_gate() {
        let router = Router::new().route("/whoami", get(|context: AuthContext| async move {
            axum::Json(context)
        }));

        let (status, body) = call(router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }
}
