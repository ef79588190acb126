//! Database models

use crate::object_id::ObjectId;
use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidObjectId(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidObjectId(s) => write!(f, "Invalid object id: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Audit trail shared by every stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// Role model (what a user may do)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Jenis user model (which organizational category a user belongs to)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenisUser {
    pub id: ObjectId,
    pub nm_jenis_user: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ObjectId,
    pub username: String,
    pub nm_user: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub role_id: ObjectId,
    pub jenis_user_id: ObjectId,
    #[serde(flatten)]
    pub audit: Audit,
}

/// New role (for insertion)
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub created_by: String,
}

/// New jenis user (for insertion)
#[derive(Debug, Clone)]
pub struct NewJenisUser {
    pub nm_jenis_user: String,
    pub created_by: String,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub nm_user: String,
    pub password_hash: String,
    pub email: String,
    pub role_id: ObjectId,
    pub jenis_user_id: ObjectId,
    pub created_by: String,
}

// ==================== TryFrom Implementations ====================

fn get_object_id(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<ObjectId, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    ObjectId::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Audit {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Audit {
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Role {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Role {
            id: get_object_id(row, "id")?,
            name: row.try_get("name")?,
            audit: Audit::try_from(row)?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for JenisUser {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(JenisUser {
            id: get_object_id(row, "id")?,
            nm_jenis_user: row.try_get("nm_jenis_user")?,
            audit: Audit::try_from(row)?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: get_object_id(row, "id")?,
            username: row.try_get("username")?,
            nm_user: row.try_get("nm_user")?,
            password_hash: row.try_get("password_hash")?,
            email: row.try_get("email")?,
            role_id: get_object_id(row, "role_id")?,
            jenis_user_id: get_object_id(row, "jenis_user_id")?,
            audit: Audit::try_from(row)?,
        })
    }
}
