//! Project repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, UpdateMany,
};
use uuid::Uuid;

use super::entities::project::{self, ActiveModel, Entity as ProjectEntity};
use common::{AppError, AppResult, OptionExt, PageParams};
use domain::{
    DomainError, NewProject, Project, ProjectFilter, ProjectPatch, ProjectStatus,
    ProjectStatusFilter,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Persistence collaborator for projects. Rows are never deleted.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Find a project by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>>;

    /// Filtered page of projects, newest first, with the total match count
    async fn list(&self, filter: ProjectFilter, page: PageParams)
        -> AppResult<(Vec<Project>, u64)>;

    /// Insert a new project
    async fn insert(&self, project: NewProject) -> AppResult<Project>;

    /// Write only the fields set in `patch`.
    ///
    /// Leaving ARCHIVED fails with a conflict even when the archive lands
    /// after the caller read the project; archiving keeps an existing
    /// `archived_at`.
    async fn update(&self, id: Uuid, patch: ProjectPatch, now: DateTime<Utc>)
        -> AppResult<Project>;
}

/// SeaORM implementation of [`ProjectRepository`].
pub struct ProjectStore {
    db: DatabaseConnection,
}

impl ProjectStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn like_pattern(search: &str) -> LikeExpr {
    let escaped = search
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{}%", escaped)).escape('\\')
}

fn filtered(filter: &ProjectFilter) -> Select<ProjectEntity> {
    let mut query = ProjectEntity::find();

    query = match filter.status {
        ProjectStatusFilter::Unarchived => query.filter(
            project::Column::Status.ne(ProjectStatus::Archived.as_str()),
        ),
        ProjectStatusFilter::All => query,
        ProjectStatusFilter::Only(status) => {
            query.filter(project::Column::Status.eq(status.as_str()))
        }
    };

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(project::Column::Name))).like(like_pattern(search)))
                .add(
                    Expr::expr(Func::lower(Expr::col(project::Column::Description)))
                        .like(like_pattern(search)),
                ),
        );
    }

    query
}

#[async_trait]
impl ProjectRepository for ProjectStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        let result = ProjectEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Project::from))
    }

    async fn list(
        &self,
        filter: ProjectFilter,
        page: PageParams,
    ) -> AppResult<(Vec<Project>, u64)> {
        let total = filtered(&filter).count(&self.db).await?;

        let models = filtered(&filter)
            .order_by_desc(project::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Project::from).collect(), total))
    }

    async fn insert(&self, project: NewProject) -> AppResult<Project> {
        let now = chrono::Utc::now();
        let archived_at = (project.status == ProjectStatus::Archived).then_some(now);
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(project.name),
            description: Set(project.description),
            billing_rate: Set(project.billing_rate),
            status: Set(project.status.as_str().to_string()),
            archived_at: Set(archived_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Project::from(model))
    }

    async fn update(
        &self,
        id: Uuid,
        patch: ProjectPatch,
        now: DateTime<Utc>,
    ) -> AppResult<Project> {
        let result = patch_statement(id, patch, now).exec(&self.db).await?;
        let current = self.find_by_id(id).await?.ok_or_not_found()?;
        if result.rows_affected == 0 {
            tracing::warn!(project_id = %id, "Status change rejected on archived project");
            return Err(AppError::from(DomainError::invalid_transition(format!(
                "Project is {} and cannot change status",
                current.status
            ))));
        }
        Ok(current)
    }
}

/// UPDATE touching only the patched columns. A status change away from
/// ARCHIVED matches no row.
fn patch_statement(
    id: Uuid,
    patch: ProjectPatch,
    now: DateTime<Utc>,
) -> UpdateMany<ProjectEntity> {
    let mut update = ProjectEntity::update_many()
        .col_expr(project::Column::UpdatedAt, Expr::value(now))
        .filter(project::Column::Id.eq(id));

    if let Some(name) = patch.name {
        update = update.col_expr(project::Column::Name, Expr::value(name));
    }
    if let Some(description) = patch.description {
        update = update.col_expr(project::Column::Description, Expr::value(description));
    }
    if let Some(rate) = patch.billing_rate {
        update = update.col_expr(project::Column::BillingRate, Expr::value(rate));
    }
    match patch.status {
        Some(ProjectStatus::Archived) => {
            update = update
                .col_expr(
                    project::Column::Status,
                    Expr::value(ProjectStatus::Archived.as_str()),
                )
                .col_expr(
                    project::Column::ArchivedAt,
                    Func::coalesce([
                        Expr::col(project::Column::ArchivedAt).into(),
                        Expr::value(now),
                    ])
                    .into(),
                );
        }
        Some(status) => {
            update = update
                .col_expr(project::Column::Status, Expr::value(status.as_str()))
                .filter(project::Column::Status.ne(ProjectStatus::Archived.as_str()));
        }
        None => {}
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(patch: ProjectPatch) -> String {
        patch_statement(Uuid::nil(), patch, Utc::now())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_field_patch_leaves_status_columns_alone() {
        let sql = sql(ProjectPatch {
            name: Some("Renamed".to_string()),
            billing_rate: Some(95.0),
            ..Default::default()
        });
        assert!(sql.contains("'Renamed'"));
        assert!(!sql.contains("\"status\""));
        assert!(!sql.contains("archived_at"));
    }

    #[test]
    fn test_status_change_never_matches_archived_row() {
        let sql = sql(ProjectPatch {
            status: Some(ProjectStatus::Active),
            ..Default::default()
        });
        assert!(sql.contains("\"status\" = 'ACTIVE'"));
        assert!(sql.contains("<> 'ARCHIVED'"));
        assert!(!sql.contains("archived_at"));
    }

    #[test]
    fn test_archive_keeps_existing_timestamp() {
        let sql = sql(ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..Default::default()
        });
        assert!(sql.contains("\"status\" = 'ARCHIVED'"));
        assert!(sql.contains("COALESCE(\"archived_at\""));
        assert!(!sql.contains("<> 'ARCHIVED'"));
    }
}
