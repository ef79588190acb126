//! UNAIR Satu Authentication and Authorization
//!
//! This crate provides signed bearer tokens, password hashing, credential
//! verification and the access gate (authentication, role and jenis-user
//! stages) for the UNAIR Satu admin API.

pub mod credentials;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;

pub use credentials::{CredentialStore, StoredCredential, verify_credentials};
pub use error::AuthError;
pub use middleware::{
    AccessPolicy, AuthContext, RequiredJenisUser, RequiredRole, authenticate, protect,
    require_jenis_user, require_role,
};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TOKEN_LIFETIME_SECS, TokenManager};
