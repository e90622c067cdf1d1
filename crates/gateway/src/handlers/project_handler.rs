//! Project and billing summary handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult, PageParams, Paginated};
use domain::{BillingSummary, Project, ProjectFilter, ProjectStatus, ProjectStatusFilter};
use timelog_service_lib::service::{ProjectChanges, ProjectInput};

use crate::extractors::{JsonBody, ValidatedQuery};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Page size when the client does not ask for one
pub const DEFAULT_PROJECT_PAGE_SIZE: u64 = 10;

/// Project listing query
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    /// Page number, starting at 1
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u64>,
    /// Page size
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<u64>,
    /// ACTIVE, COMPLETED, ARCHIVED or ALL; archived projects are hidden by default
    pub status: Option<String>,
    /// Case-insensitive match on name or description
    #[validate(length(max = 200, message = "Search must be at most 200 characters"))]
    pub search: Option<String>,
}

/// Project creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    #[schema(example = "Website redesign")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 80.0)]
    pub billing_rate: Option<f64>,
    /// Defaults to ACTIVE
    pub status: Option<ProjectStatus>,
}

/// Partial project update; `description: null` clears it
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub billing_rate: Option<f64>,
    pub status: Option<ProjectStatus>,
}

/// Distinguish an explicit `null` from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<CreateProjectRequest> for ProjectInput {
    fn from(req: CreateProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            billing_rate: req.billing_rate,
            status: req.status,
        }
    }
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            billing_rate: req.billing_rate,
            status: req.status,
        }
    }
}

/// Create project routes
pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).patch(update_project).delete(archive_project),
        )
        .route("/:id/billing-summary", get(billing_summary))
}

/// List projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Page of projects, newest first", body = crate::openapi::ProjectPage),
        (status = 400, description = "Invalid query", body = common::ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_projects(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProjectListQuery>,
) -> AppResult<Json<Paginated<Project>>> {
    let status = ProjectStatusFilter::parse(query.status.as_deref())
        .ok_or_else(|| AppError::validation("status", "Unknown project status"))?;
    let filter = ProjectFilter {
        status,
        search: query.search,
    };
    let page = PageParams::new(
        query.page,
        Some(query.limit.unwrap_or(DEFAULT_PROJECT_PAGE_SIZE)),
    );

    let projects = state
        .projects
        .list_projects(current_user.actor(), filter, page)
        .await?;
    Ok(Json(projects))
}

/// Get a project
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found", body = common::ErrorResponse)
    )
)]
pub async fn get_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    let project = state.projects.get_project(current_user.actor(), id).await?;
    Ok(Json(project))
}

/// Create a project (admin only)
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid input", body = common::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state
        .projects
        .create_project(current_user.actor(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Update a project (admin only)
#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Invalid input", body = common::ErrorResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Project not found", body = common::ErrorResponse),
        (status = 409, description = "Archived projects cannot change status", body = common::ErrorResponse)
    )
)]
pub async fn update_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProjectRequest>,
) -> AppResult<Json<Project>> {
    let project = state
        .projects
        .update_project(current_user.actor(), id, payload.into())
        .await?;
    Ok(Json(project))
}

/// Archive a project (admin only); its time logs are kept
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project archived", body = Project),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Project not found", body = common::ErrorResponse)
    )
)]
pub async fn archive_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    let project = state
        .projects
        .archive_project(current_user.actor(), id)
        .await?;
    Ok(Json(project))
}

/// Billing summary of a project (admin only)
#[utoipa::path(
    get,
    path = "/projects/{id}/billing-summary",
    tag = "Billing",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Totals by user and by date", body = BillingSummary),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Project not found", body = common::ErrorResponse)
    )
)]
pub async fn billing_summary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BillingSummary>> {
    let summary = state
        .billing
        .project_summary(current_user.actor(), id)
        .await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let cleared: UpdateProjectRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let untouched: UpdateProjectRequest = serde_json::from_str(r#"{"name": "X"}"#).unwrap();
        assert_eq!(untouched.description, None);
    }

    #[test]
    fn test_create_request_reads_camel_case() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name": "Site", "billingRate": 80, "status": "COMPLETED"}"#)
                .unwrap();
        let input = ProjectInput::from(req);
        assert_eq!(input.billing_rate, Some(80.0));
        assert_eq!(input.status, Some(ProjectStatus::Completed));
    }
}
