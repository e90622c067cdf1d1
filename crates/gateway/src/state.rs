//! Application state for dependency injection.

use std::sync::Arc;

use async_trait::async_trait;

use common::{AppError, AppResult};
use timelog_service_lib::infra::{Cache, Database};
use timelog_service_lib::service::{BillingService, ProjectService, TimeLogService};
use timelog_service_lib::Services;

use crate::config::GatewayConfig;
use crate::middleware::TokenVerifier;

/// Connectivity probe reported by the health endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl HealthProbe for Database {
    async fn ping(&self) -> AppResult<()> {
        Database::ping(self).await.map_err(AppError::from)
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub time_logs: Arc<dyn TimeLogService>,
    pub projects: Arc<dyn ProjectService>,
    pub billing: Arc<dyn BillingService>,
    /// Shared store, also backing rate limiting
    pub cache: Cache,
    pub database: Arc<dyn HealthProbe>,
    pub tokens: Arc<TokenVerifier>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create app state from wired services.
    pub fn new(services: Services, config: GatewayConfig) -> Self {
        Self {
            time_logs: services.time_logs,
            projects: services.projects,
            billing: services.billing,
            cache: services.cache,
            database: Arc::new(services.database),
            tokens: Arc::new(TokenVerifier::new(&config.jwt.secret)),
            config,
        }
    }
}
