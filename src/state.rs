//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::models::Models;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub models: Models,
    /// Loaded once at startup; read-only afterwards.
    pub config: Arc<AppConfig>,
    /// Present when `models` is backed by PostgreSQL; used by the readiness probe.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(models: Models, config: AppConfig) -> Self {
        AppState {
            models,
            config: Arc::new(config),
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
