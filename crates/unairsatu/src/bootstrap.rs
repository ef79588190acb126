//! First-run provisioning of the admin role, jenis user and account

use anyhow::Result;
use tracing::info;
use unairsatu_db::{Database, NewJenisUser, NewRole, NewUser, ObjectId};

use crate::config::BootstrapConfig;

const SYSTEM_ACTOR: &str = "system";

/// Ids of the provisioned admin role and jenis user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminIds {
    pub role_id: ObjectId,
    pub jenis_user_id: ObjectId,
}

/// Ensure the admin role and jenis user exist, and create the admin
/// account when the user table is empty.
pub async fn ensure_admin(db: &Database, config: &BootstrapConfig) -> Result<AdminIds> {
    let role_id = match db.get_role_by_name(&config.admin_role_name).await? {
        Some(role) => role.id,
        None => {
            info!("Creating role '{}'", config.admin_role_name);
            db.insert_role(NewRole {
                name: config.admin_role_name.clone(),
                created_by: SYSTEM_ACTOR.to_string(),
            })
            .await?
            .id
        }
    };

    let jenis_user_id = match db.get_jenis_user_by_name(&config.admin_jenis_user_name).await? {
        Some(jenis_user) => jenis_user.id,
        None => {
            info!("Creating jenis user '{}'", config.admin_jenis_user_name);
            db.insert_jenis_user(NewJenisUser {
                nm_jenis_user: config.admin_jenis_user_name.clone(),
                created_by: SYSTEM_ACTOR.to_string(),
            })
            .await?
            .id
        }
    };

    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = unairsatu_auth::hash_password(&config.admin_password)?;
        db.insert_user(NewUser {
            username: config.admin_username.clone(),
            nm_user: config.admin_username.clone(),
            password_hash,
            email: String::new(),
            role_id,
            jenis_user_id,
            created_by: SYSTEM_ACTOR.to_string(),
        })
        .await?;
        info!(
            "Default admin user created (username: {})",
            config.admin_username
        );
    }

    Ok(AdminIds {
        role_id,
        jenis_user_id,
    })
}
