//! Time log service - runs the write path for time logs.
//!
//! Policy gate, entry validation, per-day lock, quota check, persistence and
//! billing summary invalidation, in that order.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

use common::{AppResult, OptionExt, PageParams, Paginated};
use domain::{
    authorize, authorize_on_time_log, can_modify_time_log, quota_key, validate_changes,
    validate_entry, Action, Actor, DomainError, NewTimeLog, TimeLog, TimeLogDetail, TimeLogDraft,
    TimeLogFilter,
};

use super::billing_service::invalidate_summary;
use super::quota::QuotaEnforcer;
use crate::config::LockConfig;
use crate::infra::Cache;
use crate::repository::{ProjectRepository, TimeLogRepository, UserRepository};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Input for creating a time log.
#[derive(Debug, Clone, Default)]
pub struct CreateTimeLog {
    pub project_id: Uuid,
    /// Log on behalf of another user (admins only); defaults to the actor
    pub user_id: Option<Uuid>,
    pub draft: TimeLogDraft,
}

/// Time log service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TimeLogService: Send + Sync {
    /// List logs; employees only ever see their own
    async fn list_time_logs(
        &self,
        actor: Actor,
        filter: TimeLogFilter,
        page: PageParams,
    ) -> AppResult<Paginated<TimeLogDetail>>;

    /// Get one log the actor may view
    async fn get_time_log(&self, actor: Actor, id: Uuid) -> AppResult<TimeLog>;

    /// Create a log, enforcing the daily cap
    async fn create_time_log(&self, actor: Actor, input: CreateTimeLog) -> AppResult<TimeLog>;

    /// Partially update a log, re-checking the cap when hours or date change
    async fn update_time_log(&self, actor: Actor, id: Uuid, draft: TimeLogDraft)
        -> AppResult<TimeLog>;

    /// Delete a log
    async fn delete_time_log(&self, actor: Actor, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of [`TimeLogService`].
pub struct TimeLogManager {
    logs: Arc<dyn TimeLogRepository>,
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
    quota: QuotaEnforcer,
    cache: Cache,
    lock: LockConfig,
    today: fn() -> NaiveDate,
}

fn server_today() -> NaiveDate {
    Local::now().date_naive()
}

impl TimeLogManager {
    pub fn new(
        logs: Arc<dyn TimeLogRepository>,
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
        cache: Cache,
        lock: LockConfig,
    ) -> Self {
        Self {
            quota: QuotaEnforcer::new(logs.clone()),
            logs,
            projects,
            users,
            cache,
            lock,
            today: server_today,
        }
    }

    /// Replace the clock used to reject future dates.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run `f` while holding the quota lock for (`user_id`, `day`).
    async fn with_day_lock<T, F, Fut>(&self, user_id: Uuid, day: NaiveDate, f: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let guard = self
            .cache
            .acquire_lock(&quota_key(user_id, day), self.lock)
            .await?;

        let result = f().await;

        if let Err(e) = guard.release().await {
            tracing::warn!(user_id = %user_id, day = %day, error = %e, "Quota lock release failed");
        }
        result
    }

    async fn find_log(&self, id: Uuid) -> AppResult<TimeLog> {
        self.logs.find_by_id(id).await?.ok_or_not_found()
    }
}

#[async_trait]
impl TimeLogService for TimeLogManager {
    async fn list_time_logs(
        &self,
        actor: Actor,
        mut filter: TimeLogFilter,
        page: PageParams,
    ) -> AppResult<Paginated<TimeLogDetail>> {
        if actor.is_admin() {
            authorize(&actor, Action::TimeLogViewAny)?;
        } else {
            authorize(&actor, Action::TimeLogViewOwn)?;
            filter.user_id = Some(actor.id);
        }

        let (data, total) = self.logs.list(filter, page).await?;
        Ok(Paginated::new(data, page, total))
    }

    async fn get_time_log(&self, actor: Actor, id: Uuid) -> AppResult<TimeLog> {
        let log = self.find_log(id).await?;
        authorize_on_time_log(&actor, log.user_id, Action::TimeLogViewOwn, Action::TimeLogViewAny)?;
        Ok(log)
    }

    async fn create_time_log(&self, actor: Actor, input: CreateTimeLog) -> AppResult<TimeLog> {
        authorize(&actor, Action::TimeLogCreate)?;

        let user_id = input.user_id.unwrap_or(actor.id);
        if !can_modify_time_log(actor.role, actor.id, user_id) {
            return Err(DomainError::Forbidden.into());
        }

        let entry = validate_entry(&input.draft, (self.today)())?;

        self.projects
            .find_by_id(input.project_id)
            .await?
            .ok_or_not_found()?;
        if user_id != actor.id {
            self.users.find_by_id(user_id).await?.ok_or_not_found()?;
        }

        let project_id = input.project_id;
        let log_date = entry.log_date;
        let hours = entry.hours;

        let log = self
            .with_day_lock(user_id, log_date, || async move {
                self.quota.check_quota(user_id, log_date, hours, None).await?;
                self.logs
                    .insert(NewTimeLog {
                        project_id,
                        user_id,
                        entry,
                    })
                    .await
            })
            .await?;

        tracing::info!(
            time_log_id = %log.id,
            user_id = %log.user_id,
            project_id = %log.project_id,
            hours = log.hours,
            "Time log created"
        );
        invalidate_summary(&self.cache, log.project_id).await;
        Ok(log)
    }

    async fn update_time_log(
        &self,
        actor: Actor,
        id: Uuid,
        draft: TimeLogDraft,
    ) -> AppResult<TimeLog> {
        let existing = self.find_log(id).await?;
        authorize_on_time_log(
            &actor,
            existing.user_id,
            Action::TimeLogUpdateOwn,
            Action::TimeLogUpdateAny,
        )?;

        let changes = validate_changes(&draft, (self.today)())?;
        if changes.is_empty() {
            return Ok(existing);
        }

        let log = if changes.affects_quota() {
            let (hours, log_date) = changes.resolve(&existing);
            let user_id = existing.user_id;
            // Only the target day can gain hours.
            self.with_day_lock(user_id, log_date, || async move {
                self.quota.check_quota(user_id, log_date, hours, Some(id)).await?;
                self.logs.update(id, changes).await
            })
            .await?
        } else {
            self.logs.update(id, changes).await?
        };

        tracing::info!(time_log_id = %log.id, "Time log updated");
        invalidate_summary(&self.cache, log.project_id).await;
        Ok(log)
    }

    async fn delete_time_log(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        let existing = self.find_log(id).await?;
        authorize_on_time_log(
            &actor,
            existing.user_id,
            Action::TimeLogDeleteOwn,
            Action::TimeLogDeleteAny,
        )?;

        self.logs.delete(id).await?;

        tracing::info!(time_log_id = %id, "Time log deleted");
        invalidate_summary(&self.cache, existing.project_id).await;
        Ok(())
    }
}
