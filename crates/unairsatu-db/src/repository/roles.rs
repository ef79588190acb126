//! Role operations

use chrono::Utc;

use crate::error::DbError;
use crate::models::{Audit, NewRole, Role};
use crate::object_id::ObjectId;
use crate::repository::Database;

impl Database {
    /// Insert a new role
    pub async fn insert_role(&self, role: NewRole) -> Result<Role, DbError> {
        if self.get_role_by_name(&role.name).await?.is_some() {
            return Err(DbError::Duplicate(format!("Role '{}' already exists", role.name)));
        }

        let id = ObjectId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_hex())
        .bind(&role.name)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(&role.created_by)
        .bind(&role.created_by)
        .execute(&self.pool)
        .await?;

        Ok(Role {
            id,
            name: role.name,
            audit: Audit {
                created_at: now,
                updated_at: now,
                created_by: role.created_by.clone(),
                updated_by: role.created_by,
            },
        })
    }

    /// Get a role by ID
    pub async fn get_role_by_id(&self, id: ObjectId) -> Result<Option<Role>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at, created_by, updated_by
            FROM roles
            WHERE id = ?
            "#,
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Role::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a role by name
    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at, created_by, updated_by
            FROM roles
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Role::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all roles
    pub async fn list_roles(&self) -> Result<Vec<Role>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at, created_by, updated_by
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Role::try_from(row).map_err(DbError::from))
            .collect()
    }
}
