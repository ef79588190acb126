//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Audit, NewUser, User};
use crate::object_id::ObjectId;
use crate::repository::Database;

const USER_COLUMNS: &str = "id, username, nm_user, password_hash, email, role_id, jenis_user_id, \
                            created_at, updated_at, created_by, updated_by";

impl Database {
    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let existing = self.get_user_by_username(&user.username).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!("User '{}' already exists", user.username)));
        }

        let id = ObjectId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, nm_user, password_hash, email, role_id, jenis_user_id,
                               created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_hex())
        .bind(&user.username)
        .bind(&user.nm_user)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.role_id.to_hex())
        .bind(user.jenis_user_id.to_hex())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(&user.created_by)
        .bind(&user.created_by)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            username: user.username,
            nm_user: user.nm_user,
            password_hash: user.password_hash,
            email: user.email,
            role_id: user.role_id,
            jenis_user_id: user.jenis_user_id,
            audit: Audit {
                created_at: now,
                updated_at: now,
                created_by: user.created_by.clone(),
                updated_by: user.created_by,
            },
        })
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: ObjectId) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
