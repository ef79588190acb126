//! Request and response types

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(alias = "pass")]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Display name of the user's role
    pub role: String,
    /// Display name of the user's jenis user
    pub jenis_user: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Create role request
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// Create jenis user request
#[derive(Debug, Deserialize)]
pub struct CreateJenisUserRequest {
    pub nm_jenis_user: String,
}

/// Create user request.
///
/// Role and jenis user references arrive as hex strings and are checked
/// against stored records before the user is written.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub nm_user: String,
    #[serde(alias = "pass")]
    pub password: String,
    #[serde(default)]
    pub email: String,
    pub role_id: String,
    pub jenis_user_id: String,
}
