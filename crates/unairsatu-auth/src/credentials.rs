//! Credential lookup and verification
//!
//! The login flow depends on a [`CredentialStore`] for the stored hash and the
//! user's role / jenis-user references. Only after the password checks out
//! does the caller get a [`StoredCredential`] it can issue a token for.

use async_trait::async_trait;
use std::sync::LazyLock;
use tracing::{debug, warn};
use unairsatu_db::{Database, ObjectId};

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};

/// Hash verified when the username is unknown, so both paths cost the same
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("timing-attack-prevention").unwrap_or_default());

/// What a credential lookup returns
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub username: String,
    pub password_hash: String,
    pub role_id: ObjectId,
    pub jenis_user_id: ObjectId,
}

/// Source of stored credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(&self, username: &str)
    -> Result<Option<StoredCredential>, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, AuthError> {
        let user = self
            .get_user_by_username(username)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user.map(|u| StoredCredential {
            username: u.username,
            password_hash: u.password_hash,
            role_id: u.role_id,
            jenis_user_id: u.jenis_user_id,
        }))
    }
}

/// Verify a username / password pair.
///
/// Unknown users and wrong passwords both yield
/// [`AuthError::InvalidCredentials`]. A user without a role or jenis user
/// cannot log in.
pub async fn verify_credentials<S>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<StoredCredential, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let Some(credential) = store.find_credential(username).await? else {
        debug!("Login attempt for unknown user");
        let _ = verify_password(password, &DUMMY_HASH);
        return Err(AuthError::InvalidCredentials);
    };

    match verify_password(password, &credential.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            debug!("Password mismatch for user: {}", username);
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            warn!("Stored password hash for user {} is unreadable: {}", username, e);
            return Err(AuthError::InvalidCredentials);
        }
    }

    if credential.role_id.is_nil() {
        return Err(AuthError::MissingAssignment("role"));
    }
    if credential.jenis_user_id.is_nil() {
        return Err(AuthError::MissingAssignment("jenis user"));
    }

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemoryStore(HashMap<String, StoredCredential>);

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn find_credential(
            &self,
            username: &str,
        ) -> Result<Option<StoredCredential>, AuthError> {
            Ok(self.0.get(username).cloned())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_credential(
            &self,
            _username: &str,
        ) -> Result<Option<StoredCredential>, AuthError> {
            Err(AuthError::Store("connection refused".to_string()))
        }
    }

    fn store_with(username: &str, role_id: ObjectId, jenis_user_id: ObjectId) -> MemoryStore {
        let credential = StoredCredential {
            username: username.to_string(),
            password_hash: hash_password("s3cret-pass").unwrap(),
            role_id,
            jenis_user_id,
        };
        MemoryStore(HashMap::from([(username.to_string(), credential)]))
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let role = ObjectId::new();
        let jenis = ObjectId::new();
        let store = store_with("alice", role, jenis);

        let credential = verify_credentials(&store, "alice", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(credential.username, "alice");
        assert_eq!(credential.role_id, role);
        assert_eq!(credential.jenis_user_id, jenis);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let store = store_with("alice", ObjectId::new(), ObjectId::new());

        let unknown = verify_credentials(&store, "mallory", "s3cret-pass")
            .await
            .unwrap_err();
        let wrong = verify_credentials(&store, "alice", "guess")
            .await
            .unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unassigned_role_or_jenis_user() {
        let store = store_with("norole", ObjectId::NIL, ObjectId::new());
        let err = verify_credentials(&store, "norole", "s3cret-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAssignment("role")));

        let store = store_with("nojenis", ObjectId::new(), ObjectId::NIL);
        let err = verify_credentials(&store, "nojenis", "s3cret-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAssignment("jenis user")));
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_invalid_credentials() {
        let credential = StoredCredential {
            username: "legacy".to_string(),
            password_hash: "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy"
                .to_string(),
            role_id: ObjectId::new(),
            jenis_user_id: ObjectId::new(),
        };
        let store = MemoryStore(HashMap::from([("legacy".to_string(), credential)]));

        let err = verify_credentials(&store, "legacy", "guess")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = verify_credentials(&BrokenStore, "alice", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
