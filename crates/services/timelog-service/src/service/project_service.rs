//! Project service - CRUD with archive in place of delete.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use common::{AppResult, OptionExt, PageParams, Paginated};
use domain::{
    authorize, Action, Actor, NewProject, Project, ProjectFilter, ProjectPatch, ProjectStatus,
};

use super::billing_service::invalidate_summary;
use crate::infra::Cache;
use crate::repository::ProjectRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Raw project creation input.
#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub billing_rate: Option<f64>,
    pub status: Option<ProjectStatus>,
}

/// Raw partial project update. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub billing_rate: Option<f64>,
    pub status: Option<ProjectStatus>,
}

/// Project service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn list_projects(
        &self,
        actor: Actor,
        filter: ProjectFilter,
        page: PageParams,
    ) -> AppResult<Paginated<Project>>;

    async fn get_project(&self, actor: Actor, id: Uuid) -> AppResult<Project>;

    async fn create_project(&self, actor: Actor, input: ProjectInput) -> AppResult<Project>;

    async fn update_project(
        &self,
        actor: Actor,
        id: Uuid,
        changes: ProjectChanges,
    ) -> AppResult<Project>;

    /// Archive a project; its time logs stay untouched
    async fn archive_project(&self, actor: Actor, id: Uuid) -> AppResult<Project>;
}

/// Concrete implementation of [`ProjectService`].
pub struct ProjectManager {
    projects: Arc<dyn ProjectRepository>,
    cache: Cache,
}

impl ProjectManager {
    pub fn new(projects: Arc<dyn ProjectRepository>, cache: Cache) -> Self {
        Self { projects, cache }
    }

    async fn find_project(&self, id: Uuid) -> AppResult<Project> {
        self.projects.find_by_id(id).await?.ok_or_not_found()
    }
}

#[async_trait]
impl ProjectService for ProjectManager {
    async fn list_projects(
        &self,
        actor: Actor,
        filter: ProjectFilter,
        page: PageParams,
    ) -> AppResult<Paginated<Project>> {
        authorize(&actor, Action::ProjectView)?;
        let (data, total) = self.projects.list(filter, page).await?;
        Ok(Paginated::new(data, page, total))
    }

    async fn get_project(&self, actor: Actor, id: Uuid) -> AppResult<Project> {
        authorize(&actor, Action::ProjectView)?;
        self.find_project(id).await
    }

    async fn create_project(&self, actor: Actor, input: ProjectInput) -> AppResult<Project> {
        authorize(&actor, Action::ProjectCreate)?;

        let new_project = NewProject::validate(
            &input.name,
            input.description,
            input.billing_rate,
            input.status,
        )?;
        let project = self.projects.insert(new_project).await?;

        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    async fn update_project(
        &self,
        actor: Actor,
        id: Uuid,
        changes: ProjectChanges,
    ) -> AppResult<Project> {
        authorize(&actor, Action::ProjectUpdate)?;
        if changes.status == Some(ProjectStatus::Archived) {
            authorize(&actor, Action::ProjectArchive)?;
        }

        let patch = ProjectPatch::validate(
            changes.name.as_deref(),
            changes.description,
            changes.billing_rate,
            changes.status,
        )?;

        let mut project = self.find_project(id).await?;
        if patch.is_empty() {
            return Ok(project);
        }

        let now = Utc::now();
        project.apply(patch.clone(), now)?;
        let project = self.projects.update(id, patch, now).await?;

        tracing::info!(project_id = %project.id, status = %project.status, "Project updated");
        invalidate_summary(&self.cache, project.id).await;
        Ok(project)
    }

    async fn archive_project(&self, actor: Actor, id: Uuid) -> AppResult<Project> {
        authorize(&actor, Action::ProjectArchive)?;

        let project = self.find_project(id).await?;
        if project.is_archived() {
            return Ok(project);
        }

        let patch = ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..Default::default()
        };
        let project = self.projects.update(id, patch, Utc::now()).await?;

        tracing::info!(project_id = %project.id, "Project archived");
        invalidate_summary(&self.cache, project.id).await;
        Ok(project)
    }
}
