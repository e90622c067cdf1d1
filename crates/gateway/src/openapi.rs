//! OpenAPI documentation.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use common::{ErrorBody, ErrorResponse, PaginationMeta};
use domain::{
    BillingSummary, DateHours, FieldError, Project, ProjectRef, ProjectStatus, TimeLog,
    TimeLogDetail, TimeLogStatus, UserHours, UserRef,
};

use crate::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::handlers::project_handler::{CreateProjectRequest, UpdateProjectRequest};
use crate::handlers::time_log_handler::{CreateTimeLogRequest, UpdateTimeLogRequest};

/// Page of projects
#[derive(ToSchema)]
pub struct ProjectPage {
    pub data: Vec<Project>,
    pub meta: PaginationMeta,
}

/// Page of time logs with author and project
#[derive(ToSchema)]
pub struct TimeLogPage {
    pub data: Vec<TimeLogDetail>,
    pub meta: PaginationMeta,
}

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::project_handler::list_projects,
        crate::handlers::project_handler::get_project,
        crate::handlers::project_handler::create_project,
        crate::handlers::project_handler::update_project,
        crate::handlers::project_handler::archive_project,
        crate::handlers::project_handler::billing_summary,
        crate::handlers::time_log_handler::list_time_logs,
        crate::handlers::time_log_handler::get_time_log,
        crate::handlers::time_log_handler::create_time_log,
        crate::handlers::time_log_handler::update_time_log,
        crate::handlers::time_log_handler::delete_time_log,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
            ErrorResponse,
            ErrorBody,
            FieldError,
            PaginationMeta,
            Project,
            ProjectStatus,
            ProjectPage,
            CreateProjectRequest,
            UpdateProjectRequest,
            TimeLog,
            TimeLogStatus,
            TimeLogDetail,
            TimeLogPage,
            ProjectRef,
            UserRef,
            CreateTimeLogRequest,
            UpdateTimeLogRequest,
            BillingSummary,
            UserHours,
            DateHours,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency health"),
        (name = "Projects", description = "Project management"),
        (name = "Time Logs", description = "Time tracking under the daily hour cap"),
        (name = "Billing", description = "Billable hours and amounts per project"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(domain::AUTH_COOKIE_NAME))),
            );
        }
    }
}
