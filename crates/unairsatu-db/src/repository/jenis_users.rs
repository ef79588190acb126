//! Jenis user operations

use chrono::Utc;

use crate::error::DbError;
use crate::models::{Audit, JenisUser, NewJenisUser};
use crate::object_id::ObjectId;
use crate::repository::Database;

impl Database {
    /// Insert a new jenis user
    pub async fn insert_jenis_user(&self, jenis_user: NewJenisUser) -> Result<JenisUser, DbError> {
        if self
            .get_jenis_user_by_name(&jenis_user.nm_jenis_user)
            .await?
            .is_some()
        {
            return Err(DbError::Duplicate(format!(
                "Jenis user '{}' already exists",
                jenis_user.nm_jenis_user
            )));
        }

        let id = ObjectId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO jenis_users (id, nm_jenis_user, created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_hex())
        .bind(&jenis_user.nm_jenis_user)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(&jenis_user.created_by)
        .bind(&jenis_user.created_by)
        .execute(&self.pool)
        .await?;

        Ok(JenisUser {
            id,
            nm_jenis_user: jenis_user.nm_jenis_user,
            audit: Audit {
                created_at: now,
                updated_at: now,
                created_by: jenis_user.created_by.clone(),
                updated_by: jenis_user.created_by,
            },
        })
    }

    /// Get a jenis user by ID
    pub async fn get_jenis_user_by_id(&self, id: ObjectId) -> Result<Option<JenisUser>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, nm_jenis_user, created_at, updated_at, created_by, updated_by
            FROM jenis_users
            WHERE id = ?
            "#,
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| JenisUser::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a jenis user by name
    pub async fn get_jenis_user_by_name(&self, name: &str) -> Result<Option<JenisUser>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, nm_jenis_user, created_at, updated_at, created_by, updated_by
            FROM jenis_users
            WHERE nm_jenis_user = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| JenisUser::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all jenis users
    pub async fn list_jenis_users(&self) -> Result<Vec<JenisUser>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, nm_jenis_user, created_at, updated_at, created_by, updated_by
            FROM jenis_users
            ORDER BY nm_jenis_user
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| JenisUser::try_from(row).map_err(DbError::from))
            .collect()
    }
}
