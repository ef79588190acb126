//! Admin route group
//!
//! Every route here sits behind the access gate configured in
//! [`AppState::admin_access`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::{debug, info};
use unairsatu_auth::{AuthContext, hash_password, protect};
use unairsatu_db::{JenisUser, NewJenisUser, NewRole, NewUser, ObjectId, Role, User};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateJenisUserRequest, CreateRoleRequest, CreateUserRequest};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed role / jenis user name length
const MAX_NAME_LENGTH: usize = 128;

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, dots, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn validate_name(field: &str, name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{field} exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn parse_id(field: &str, value: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {field}: {value}")))
}

// ==================== Identity ====================

/// GET /api/admin/me
async fn me(context: AuthContext) -> Json<AuthContext> {
    Json(context)
}

// ==================== Roles ====================

/// POST /api/admin/create-roles
async fn create_role(
    State(state): State<AppState>,
    context: AuthContext,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    validate_name("Role name", &request.name)?;

    let role = state
        .db
        .insert_role(NewRole {
            name: request.name,
            created_by: context.username,
        })
        .await?;

    info!("Created role: {} ({})", role.name, role.id);
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /api/admin/get-roles
async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.db.list_roles().await?))
}

/// GET /api/admin/get-roles/{id}
async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    let id = parse_id("role id", &id)?;
    let role = state
        .db
        .get_role_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role {} not found", id)))?;
    Ok(Json(role))
}

// ==================== Jenis Users ====================

/// POST /api/admin/create-jenis-user
async fn create_jenis_user(
    State(state): State<AppState>,
    context: AuthContext,
    Json(request): Json<CreateJenisUserRequest>,
) -> Result<(StatusCode, Json<JenisUser>), ApiError> {
    validate_name("Jenis user name", &request.nm_jenis_user)?;

    let jenis_user = state
        .db
        .insert_jenis_user(NewJenisUser {
            nm_jenis_user: request.nm_jenis_user,
            created_by: context.username,
        })
        .await?;

    info!(
        "Created jenis user: {} ({})",
        jenis_user.nm_jenis_user, jenis_user.id
    );
    Ok((StatusCode::CREATED, Json(jenis_user)))
}

/// GET /api/admin/get-jenis-users
async fn list_jenis_users(State(state): State<AppState>) -> Result<Json<Vec<JenisUser>>, ApiError> {
    Ok(Json(state.db.list_jenis_users().await?))
}

/// GET /api/admin/get-jenis-user/{id}
async fn get_jenis_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JenisUser>, ApiError> {
    let id = parse_id("jenis user id", &id)?;
    let jenis_user = state
        .db
        .get_jenis_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Jenis user {} not found", id)))?;
    Ok(Json(jenis_user))
}

// ==================== Users ====================

/// POST /api/admin/create-user
async fn create_user(
    State(state): State<AppState>,
    context: AuthContext,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    let role_id = parse_id("role id", &request.role_id)?;
    let jenis_user_id = parse_id("jenis user id", &request.jenis_user_id)?;

    if state.db.get_role_by_id(role_id).await?.is_none() {
        return Err(ApiError::BadRequest(format!("Unknown role id: {}", role_id)));
    }
    if state.db.get_jenis_user_by_id(jenis_user_id).await?.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown jenis user id: {}",
            jenis_user_id
        )));
    }

    debug!("Creating user: {}", request.username);

    let password_hash = hash_password(&request.password)?;
    let nm_user = if request.nm_user.is_empty() {
        request.username.clone()
    } else {
        request.nm_user
    };

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            nm_user,
            password_hash,
            email: request.email,
            role_id,
            jenis_user_id,
            created_by: context.username,
        })
        .await?;

    info!("Created user: {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/admin/get-users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.db.list_users().await?))
}

/// GET /api/admin/get-user/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id("user id", &id)?;
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

/// Create admin routes, gated per `state.admin_access`
pub fn routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/me", get(me))
        .route("/create-roles", post(create_role))
        .route("/get-roles", get(list_roles))
        .route("/get-roles/{id}", get(get_role))
        .route("/create-jenis-user", post(create_jenis_user))
        .route("/get-jenis-users", get(list_jenis_users))
        .route("/get-jenis-user/{id}", get(get_jenis_user))
        .route("/create-user", post(create_user))
        .route("/get-users", get(list_users))
        .route("/get-user/{id}", get(get_user));

    protect(router, state.tokens.clone(), state.admin_access)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("dosen.ftmm-01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("s3cret-pass").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(257)).is_err());
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("role id", "675d1cd023322aa0cdbdfdbd").is_ok());
        assert!(matches!(
            parse_id("role id", "nope"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
