//! Time log handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult, PageParams, Paginated};
use domain::{HoursInput, TimeLog, TimeLogDetail, TimeLogDraft, TimeLogFilter, TimeLogStatus};
use timelog_service_lib::service::CreateTimeLog;

use crate::extractors::{JsonBody, ValidatedQuery};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Time log listing query
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TimeLogListQuery {
    pub project_id: Option<Uuid>,
    /// Ignored for employees, who only see their own logs
    pub user_id: Option<Uuid>,
    /// TODO, IN_PROGRESS or DONE
    pub status: Option<String>,
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<u64>,
}

/// Time log creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeLogRequest {
    pub project_id: Uuid,
    /// Log on behalf of another user (admin only)
    pub user_id: Option<Uuid>,
    /// Number or numeric string, in (0, 12]
    #[schema(value_type = Option<f64>, example = 6.5)]
    pub hours: Option<HoursInput>,
    /// 5 to 1000 characters after trimming
    #[schema(example = "Implemented the billing summary endpoint")]
    pub notes: Option<String>,
    /// Calendar date, not after today
    #[schema(example = "2025-01-16")]
    pub log_date: Option<String>,
    /// Defaults to TODO
    #[schema(value_type = Option<TimeLogStatus>)]
    pub status: Option<String>,
}

/// Partial time log update; only supplied fields change
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimeLogRequest {
    #[schema(value_type = Option<f64>, example = 4)]
    pub hours: Option<HoursInput>,
    pub notes: Option<String>,
    #[schema(example = "2025-01-16")]
    pub log_date: Option<String>,
    #[schema(value_type = Option<TimeLogStatus>)]
    pub status: Option<String>,
}

impl From<CreateTimeLogRequest> for CreateTimeLog {
    fn from(req: CreateTimeLogRequest) -> Self {
        Self {
            project_id: req.project_id,
            user_id: req.user_id,
            draft: TimeLogDraft {
                hours: req.hours,
                notes: req.notes,
                log_date: req.log_date,
                status: req.status,
            },
        }
    }
}

impl From<UpdateTimeLogRequest> for TimeLogDraft {
    fn from(req: UpdateTimeLogRequest) -> Self {
        Self {
            hours: req.hours,
            notes: req.notes,
            log_date: req.log_date,
            status: req.status,
        }
    }
}

/// Create time log routes
pub fn time_log_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_time_logs).post(create_time_log))
        .route(
            "/:id",
            get(get_time_log)
                .patch(update_time_log)
                .delete(delete_time_log),
        )
}

/// List time logs
#[utoipa::path(
    get,
    path = "/time-logs",
    tag = "Time Logs",
    security(("bearer_auth" = [])),
    params(TimeLogListQuery),
    responses(
        (status = 200, description = "Page of time logs, newest date first", body = crate::openapi::TimeLogPage),
        (status = 400, description = "Invalid query", body = common::ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_time_logs(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TimeLogListQuery>,
) -> AppResult<Json<Paginated<TimeLogDetail>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            TimeLogStatus::parse(s)
                .ok_or_else(|| AppError::validation("status", "Unknown time log status"))
        })
        .transpose()?;
    let filter = TimeLogFilter {
        project_id: query.project_id,
        user_id: query.user_id,
        status,
    };

    let logs = state
        .time_logs
        .list_time_logs(
            current_user.actor(),
            filter,
            PageParams::new(query.page, query.limit),
        )
        .await?;
    Ok(Json(logs))
}

/// Get a time log
#[utoipa::path(
    get,
    path = "/time-logs/{id}",
    tag = "Time Logs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Time log ID")),
    responses(
        (status = 200, description = "Time log", body = TimeLog),
        (status = 403, description = "Forbidden - Not your log"),
        (status = 404, description = "Time log not found", body = common::ErrorResponse)
    )
)]
pub async fn get_time_log(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TimeLog>> {
    let log = state.time_logs.get_time_log(current_user.actor(), id).await?;
    Ok(Json(log))
}

/// Log hours against a project
#[utoipa::path(
    post,
    path = "/time-logs",
    tag = "Time Logs",
    security(("bearer_auth" = [])),
    request_body = CreateTimeLogRequest,
    responses(
        (status = 201, description = "Time log created", body = TimeLog),
        (status = 400, description = "Invalid input or daily limit exceeded", body = common::ErrorResponse),
        (status = 403, description = "Forbidden - Cannot log for another user"),
        (status = 404, description = "Project or user not found", body = common::ErrorResponse)
    )
)]
pub async fn create_time_log(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateTimeLogRequest>,
) -> AppResult<(StatusCode, Json<TimeLog>)> {
    let log = state
        .time_logs
        .create_time_log(current_user.actor(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

/// Update a time log
#[utoipa::path(
    patch,
    path = "/time-logs/{id}",
    tag = "Time Logs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Time log ID")),
    request_body = UpdateTimeLogRequest,
    responses(
        (status = 200, description = "Time log updated", body = TimeLog),
        (status = 400, description = "Invalid input or daily limit exceeded", body = common::ErrorResponse),
        (status = 403, description = "Forbidden - Not your log"),
        (status = 404, description = "Time log not found", body = common::ErrorResponse)
    )
)]
pub async fn update_time_log(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateTimeLogRequest>,
) -> AppResult<Json<TimeLog>> {
    let log = state
        .time_logs
        .update_time_log(current_user.actor(), id, payload.into())
        .await?;
    Ok(Json(log))
}

/// Delete a time log
#[utoipa::path(
    delete,
    path = "/time-logs/{id}",
    tag = "Time Logs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Time log ID")),
    responses(
        (status = 204, description = "Time log deleted"),
        (status = 403, description = "Forbidden - Not your log"),
        (status = 404, description = "Time log not found", body = common::ErrorResponse)
    )
)]
pub async fn delete_time_log(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .time_logs
        .delete_time_log(current_user.actor(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_string_hours() {
        let req: CreateTimeLogRequest = serde_json::from_str(
            r#"{"projectId": "7c9e6679-7425-40de-944b-e07fc1f90ae7", "hours": "2.5", "notes": "Code review", "logDate": "2025-01-16"}"#,
        )
        .unwrap();
        let input = CreateTimeLog::from(req);
        assert_eq!(input.draft.hours, Some(HoursInput::Text("2.5".to_string())));
        assert_eq!(input.user_id, None);
        assert_eq!(input.draft.status, None);
    }
}
