//! UNAIR Satu REST API
//!
//! This crate provides the Axum-based HTTP API: health and metrics endpoints,
//! login, and the gated admin route group.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
