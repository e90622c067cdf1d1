//! Time Log Service Library
//!
//! Time tracking and billing core: time log writes under the daily hour
//! cap, project management, billing summaries and the stores behind them.
//! The gateway embeds it through [`build_services`].

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use crate::config::TimeLogServiceConfig;
use crate::infra::{Cache, Database, MemoryStore, RedisStore};
use crate::repository::{ProjectStore, TimeLogStore, UserStore};
use crate::service::{
    BillingReporter, BillingService, ProjectManager, ProjectService, TimeLogManager,
    TimeLogService,
};

/// Wired services sharing one database pool and one key/value store.
#[derive(Clone)]
pub struct Services {
    pub time_logs: Arc<dyn TimeLogService>,
    pub projects: Arc<dyn ProjectService>,
    pub billing: Arc<dyn BillingService>,
    pub cache: Cache,
    pub database: Database,
}

/// Connect to the database and the store, then wire repositories and services.
pub async fn build_services(
    config: &TimeLogServiceConfig,
) -> Result<Services, Box<dyn std::error::Error>> {
    let database = Database::connect(&config.database).await?;

    let cache = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url).await?;
            info!("Using Redis store");
            Cache::new(Arc::new(store))
        }
        None => {
            info!("REDIS_URL not set, using in-process store");
            Cache::new(Arc::new(MemoryStore::new()))
        }
    };

    let conn = database.get_connection();
    let log_repo = Arc::new(TimeLogStore::new(conn.clone()));
    let project_repo = Arc::new(ProjectStore::new(conn.clone()));
    let user_repo = Arc::new(UserStore::new(conn));

    let time_logs = Arc::new(TimeLogManager::new(
        log_repo.clone(),
        project_repo.clone(),
        user_repo,
        cache.clone(),
        config.lock,
    ));
    let projects = Arc::new(ProjectManager::new(project_repo.clone(), cache.clone()));
    let billing = Arc::new(BillingReporter::new(
        project_repo,
        log_repo,
        cache.clone(),
        config.summary_cache_ttl_seconds,
    ));

    Ok(Services {
        time_logs,
        projects,
        billing,
        cache,
        database,
    })
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = TimeLogServiceConfig::from_env();
    let db = Database::connect(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
