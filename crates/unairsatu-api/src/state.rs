//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use unairsatu_auth::{AccessPolicy, TokenManager};
use unairsatu_db::Database;

/// Prometheus render handle served on `/metrics`
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenManager>,
    /// Gate requirements for the admin route group
    pub admin_access: AccessPolicy,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenManager>, admin_access: AccessPolicy) -> Self {
        Self {
            db,
            tokens,
            admin_access,
        }
    }
}
