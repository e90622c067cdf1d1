//! Billing summary service.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppResult, OptionExt};
use domain::{authorize, summarize, Action, Actor, BillingSummary};

use crate::infra::{Cache, CACHE_PREFIX_SUMMARY};
use crate::repository::{ProjectRepository, TimeLogRepository};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Billing service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Billable totals of a project, grouped by user and by date
    async fn project_summary(&self, actor: Actor, project_id: Uuid) -> AppResult<BillingSummary>;
}

fn summary_key(project_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_SUMMARY, project_id)
}

/// Drop the cached summary of a project after one of its logs changed.
///
/// Failures are logged only; the entry expires through its TTL anyway.
pub(crate) async fn invalidate_summary(cache: &Cache, project_id: Uuid) {
    if let Err(e) = cache.delete(&summary_key(project_id)).await {
        tracing::warn!(project_id = %project_id, error = %e, "Failed to invalidate billing summary");
    }
}

/// Concrete implementation of [`BillingService`].
pub struct BillingReporter {
    projects: Arc<dyn ProjectRepository>,
    logs: Arc<dyn TimeLogRepository>,
    cache: Cache,
    ttl_seconds: u64,
}

impl BillingReporter {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        logs: Arc<dyn TimeLogRepository>,
        cache: Cache,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            projects,
            logs,
            cache,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl BillingService for BillingReporter {
    async fn project_summary(&self, actor: Actor, project_id: Uuid) -> AppResult<BillingSummary> {
        authorize(&actor, Action::BillingView)?;

        let key = summary_key(project_id);
        match self.cache.get::<BillingSummary>(&key).await {
            Ok(Some(summary)) => {
                tracing::debug!(project_id = %project_id, "Billing summary cache hit");
                return Ok(summary);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Billing summary cache read failed"),
        }

        let (project, logs) = futures::try_join!(
            self.projects.find_by_id(project_id),
            self.logs.find_by_project(project_id),
        )?;
        let project = project.ok_or_not_found()?;

        let summary = summarize(project.billing_rate, &logs);

        if let Err(e) = self
            .cache
            .set_with_ttl(&key, &summary, self.ttl_seconds)
            .await
        {
            tracing::warn!(error = %e, "Billing summary cache write failed");
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockProjectRepository, MockTimeLogRepository};
    use chrono::{NaiveDate, Utc};
    use common::AppError;
    use domain::{
        Project, ProjectRef, ProjectStatus, TimeLog, TimeLogDetail, TimeLogStatus, UserRef,
        UserRole,
    };

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), UserRole::Admin)
    }

    fn project(id: Uuid, rate: f64) -> Project {
        let now = Utc::now();
        Project {
            id,
            name: "Website".to_string(),
            description: None,
            billing_rate: rate,
            status: ProjectStatus::Active,
            archived_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn detail(project_id: Uuid, user: &UserRef, hours: f64, day: u32) -> TimeLogDetail {
        let now = Utc::now();
        TimeLogDetail {
            log: TimeLog {
                id: Uuid::new_v4(),
                project_id,
                user_id: user.id,
                hours,
                notes: "Frontend work".to_string(),
                log_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
                status: TimeLogStatus::Done,
                created_at: now,
                updated_at: now,
            },
            user: user.clone(),
            project: ProjectRef {
                id: project_id,
                name: "Website".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_summary_computed_then_served_from_cache() {
        let project_id = Uuid::new_v4();
        let alice = UserRef {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let logs = vec![
            detail(project_id, &alice, 5.0, 15),
            detail(project_id, &alice, 6.0, 16),
        ];

        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_by_id()
            .times(1)
            .returning(|id| Ok(Some(project(id, 80.0))));
        let mut repo = MockTimeLogRepository::new();
        repo.expect_find_by_project()
            .times(1)
            .returning(move |_| Ok(logs.clone()));

        let reporter =
            BillingReporter::new(Arc::new(projects), Arc::new(repo), Cache::in_memory(), 30);

        let first = reporter.project_summary(admin(), project_id).await.unwrap();
        assert_eq!(first.total_hours, 11.0);
        assert_eq!(first.total_amount, 880.0);
        assert_eq!(first.hours_by_date[0].date, "2025-01-16");

        let second = reporter.project_summary(admin(), project_id).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_invalidation_forces_recompute() {
        let project_id = Uuid::new_v4();
        let cache = Cache::in_memory();

        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_by_id()
            .times(2)
            .returning(|id| Ok(Some(project(id, 50.0))));
        let mut repo = MockTimeLogRepository::new();
        repo.expect_find_by_project()
            .times(2)
            .returning(|_| Ok(Vec::new()));

        let reporter = BillingReporter::new(Arc::new(projects), Arc::new(repo), cache.clone(), 30);

        reporter.project_summary(admin(), project_id).await.unwrap();
        invalidate_summary(&cache, project_id).await;
        let summary = reporter.project_summary(admin(), project_id).await.unwrap();
        assert_eq!(summary, BillingSummary::default());
    }

    #[tokio::test]
    async fn test_employee_forbidden() {
        let reporter = BillingReporter::new(
            Arc::new(MockProjectRepository::new()),
            Arc::new(MockTimeLogRepository::new()),
            Cache::in_memory(),
            30,
        );
        let employee = Actor::new(Uuid::new_v4(), UserRole::Employee);
        let result = reporter.project_summary(employee, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_unknown_project_not_found() {
        let mut projects = MockProjectRepository::new();
        projects.expect_find_by_id().returning(|_| Ok(None));
        let mut repo = MockTimeLogRepository::new();
        repo.expect_find_by_project().returning(|_| Ok(Vec::new()));

        let reporter =
            BillingReporter::new(Arc::new(projects), Arc::new(repo), Cache::in_memory(), 30);
        let result = reporter.project_summary(admin(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
