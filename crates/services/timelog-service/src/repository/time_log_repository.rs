//! Time log repository.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::project::{self, Entity as ProjectEntity};
use super::entities::time_log::{self, ActiveModel, Entity as TimeLogEntity};
use super::entities::user::{self, Entity as UserEntity};
use common::{AppError, AppResult, OptionExt, PageParams};
use domain::{
    NewTimeLog, ProjectRef, TimeLog, TimeLogChanges, TimeLogDetail, TimeLogFilter, UserRef,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Persistence collaborator for time logs.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TimeLogRepository: Send + Sync {
    /// Find a time log by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TimeLog>>;

    /// Logs of `user_id` dated within `start..=end`, minus `exclude_id`
    async fn find_by_user_and_date_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<TimeLog>>;

    /// Every log of a project with author and project, read as one snapshot
    async fn find_by_project(&self, project_id: Uuid) -> AppResult<Vec<TimeLogDetail>>;

    /// Filtered page of logs, newest date first, with the total match count
    async fn list(
        &self,
        filter: TimeLogFilter,
        page: PageParams,
    ) -> AppResult<(Vec<TimeLogDetail>, u64)>;

    /// Insert a new time log
    async fn insert(&self, new_log: NewTimeLog) -> AppResult<TimeLog>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, changes: TimeLogChanges) -> AppResult<TimeLog>;

    /// Delete a time log
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM implementation of [`TimeLogRepository`].
pub struct TimeLogStore {
    db: DatabaseConnection,
}

impl TimeLogStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn filtered(filter: &TimeLogFilter) -> Select<TimeLogEntity> {
    let mut query = TimeLogEntity::find();
    if let Some(project_id) = filter.project_id {
        query = query.filter(time_log::Column::ProjectId.eq(project_id));
    }
    if let Some(user_id) = filter.user_id {
        query = query.filter(time_log::Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(time_log::Column::Status.eq(status.as_str()));
    }
    query
}

/// Join logs with their authors and projects using two batched lookups.
async fn attach_details<C: ConnectionTrait>(
    conn: &C,
    logs: Vec<time_log::Model>,
) -> AppResult<Vec<TimeLogDetail>> {
    if logs.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: HashSet<Uuid> = logs.iter().map(|l| l.user_id).collect();
    let project_ids: HashSet<Uuid> = logs.iter().map(|l| l.project_id).collect();

    let users: HashMap<Uuid, UserRef> = UserEntity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, UserRef::from(m)))
        .collect();

    let projects: HashMap<Uuid, ProjectRef> = ProjectEntity::find()
        .filter(project::Column::Id.is_in(project_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, ProjectRef::from(m)))
        .collect();

    logs.into_iter()
        .map(|model| {
            let user = users.get(&model.user_id).cloned().ok_or_else(|| {
                AppError::internal(format!("time log {} references a missing user", model.id))
            })?;
            let project = projects.get(&model.project_id).cloned().ok_or_else(|| {
                AppError::internal(format!("time log {} references a missing project", model.id))
            })?;
            Ok(TimeLogDetail {
                log: TimeLog::from(model),
                user,
                project,
            })
        })
        .collect()
}

#[async_trait]
impl TimeLogRepository for TimeLogStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TimeLog>> {
        let result = TimeLogEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(TimeLog::from))
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<TimeLog>> {
        let mut query = TimeLogEntity::find()
            .filter(time_log::Column::UserId.eq(user_id))
            .filter(time_log::Column::LogDate.between(start, end));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(time_log::Column::Id.ne(exclude_id));
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(TimeLog::from).collect())
    }

    async fn find_by_project(&self, project_id: Uuid) -> AppResult<Vec<TimeLogDetail>> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;

        let logs = TimeLogEntity::find()
            .filter(time_log::Column::ProjectId.eq(project_id))
            .order_by_desc(time_log::Column::LogDate)
            .order_by_asc(time_log::Column::CreatedAt)
            .all(&txn)
            .await?;
        let details = attach_details(&txn, logs).await?;

        txn.commit().await?;
        Ok(details)
    }

    async fn list(
        &self,
        filter: TimeLogFilter,
        page: PageParams,
    ) -> AppResult<(Vec<TimeLogDetail>, u64)> {
        let total = filtered(&filter).count(&self.db).await?;

        let logs = filtered(&filter)
            .order_by_desc(time_log::Column::LogDate)
            .order_by_desc(time_log::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((attach_details(&self.db, logs).await?, total))
    }

    async fn insert(&self, new_log: NewTimeLog) -> AppResult<TimeLog> {
        let now = chrono::Utc::now();
        let entry = new_log.entry;
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(new_log.project_id),
            user_id: Set(new_log.user_id),
            hours: Set(entry.hours),
            notes: Set(entry.notes),
            log_date: Set(entry.log_date),
            status: Set(entry.status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(TimeLog::from(model))
    }

    async fn update(&self, id: Uuid, changes: TimeLogChanges) -> AppResult<TimeLog> {
        let model = TimeLogEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found()?;

        let mut active: ActiveModel = model.into();
        if let Some(hours) = changes.hours {
            active.hours = Set(hours);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(notes);
        }
        if let Some(log_date) = changes.log_date {
            active.log_date = Set(log_date);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(TimeLog::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = TimeLogEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
