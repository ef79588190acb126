//! UNAIR Satu Database Layer
//!
//! Document models and the SQLite-backed repository for roles,
//! jenis users and users.

pub mod error;
pub mod models;
pub mod object_id;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use object_id::ObjectId;
pub use repository::Database;
