//! Login route

use axum::{Json, Router, extract::State, routing::post};
use tracing::{debug, info};
use unairsatu_auth::{TOKEN_LIFETIME_SECS, verify_credentials};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

fn validate_login_input(request: &LoginRequest) -> Result<(), ApiError> {
    if request.username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if request.username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login_input(&request)?;

    debug!("Login attempt for user: {}", request.username);

    let credential = verify_credentials(&state.db, &request.username, &request.password).await?;

    let role = state
        .db
        .get_role_by_id(credential.role_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Role {} not found", credential.role_id)))?;
    let jenis_user = state
        .db
        .get_jenis_user_by_id(credential.jenis_user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(format!("Jenis user {} not found", credential.jenis_user_id))
        })?;

    let token = state
        .tokens
        .issue(&credential.username, credential.role_id, credential.jenis_user_id)?;

    metrics::counter!("unairsatu_logins_total").increment(1);
    info!("User {} logged in successfully", credential.username);

    Ok(Json(LoginResponse {
        token,
        role: role.name,
        jenis_user: jenis_user.nm_jenis_user,
        expires_in: TOKEN_LIFETIME_SECS,
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/login", post(login))
}
