//! Integration tests for API endpoints.
//!
//! The router runs against mocked services and the in-process store, so no
//! database or Redis is needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::{AppError, AppResult, JwtConfig, Paginated, RateLimitConfig};
use domain::{
    FieldError, Project, ProjectStatus, ProjectStatusFilter, TimeLog, TimeLogStatus, UserRole,
};
use gateway_lib::config::GatewayConfig;
use gateway_lib::middleware::{Claims, TokenVerifier};
use gateway_lib::routes::create_router;
use gateway_lib::state::{AppState, HealthProbe};
use timelog_service_lib::config::TimeLogServiceConfig;
use timelog_service_lib::infra::Cache;
use timelog_service_lib::service::{MockBillingService, MockProjectService, MockTimeLogService};

const SECRET: &str = "test-secret-key-for-testing-only-32chars";

// =============================================================================
// Test Harness
// =============================================================================

struct FakeDatabase(bool);

#[async_trait]
impl HealthProbe for FakeDatabase {
    async fn ping(&self) -> AppResult<()> {
        if self.0 {
            Ok(())
        } else {
            Err(AppError::internal("connection refused"))
        }
    }
}

struct Harness {
    time_logs: MockTimeLogService,
    projects: MockProjectService,
    billing: MockBillingService,
    max_requests: u64,
    database_up: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            time_logs: MockTimeLogService::new(),
            projects: MockProjectService::new(),
            billing: MockBillingService::new(),
            max_requests: 100,
            database_up: true,
        }
    }

    fn router(self) -> Router {
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            rate_limit: RateLimitConfig {
                max_requests: self.max_requests,
                window_seconds: 60,
            },
            jwt: JwtConfig {
                secret: SECRET.to_string(),
            },
            service: TimeLogServiceConfig::default(),
        };

        create_router(AppState {
            time_logs: Arc::new(self.time_logs),
            projects: Arc::new(self.projects),
            billing: Arc::new(self.billing),
            cache: Cache::in_memory(),
            database: Arc::new(FakeDatabase(self.database_up)),
            tokens: Arc::new(TokenVerifier::new(SECRET)),
            config,
        })
    }
}

fn token(user_id: Uuid, role: UserRole) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: "someone@example.com".to_string(),
        role: role.as_str().to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Forwarded-For", "203.0.113.7");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn project(status: ProjectStatus) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        name: "Website".to_string(),
        description: None,
        billing_rate: 80.0,
        status,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Health and Authentication
// =============================================================================

#[tokio::test]
async fn test_health_reports_dependencies() {
    let app = Harness::new().router();
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["store"]["status"], "healthy");
}

#[tokio::test]
async fn test_health_degraded_when_database_down() {
    let mut harness = Harness::new();
    harness.database_up = false;

    let response = harness
        .router()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["services"]["database"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = Harness::new().router();
    let response = app
        .oneshot(request("GET", "/projects", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let app = Harness::new().router();
    let response = app
        .oneshot(request("GET", "/projects", Some("not-a-jwt"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cookie_token_accepted() {
    let user_id = Uuid::new_v4();
    let mut harness = Harness::new();
    harness
        .projects
        .expect_list_projects()
        .withf(move |actor, filter, page| {
            actor.id == user_id
                && filter.status == ProjectStatusFilter::Unarchived
                && page.limit == 10
        })
        .returning(|_, _, page| Ok(Paginated::new(vec![project(ProjectStatus::Active)], page, 1)));

    let request = Request::builder()
        .uri("/projects")
        .header(
            header::COOKIE,
            format!("auth-token={}", token(user_id, UserRole::Employee)),
        )
        .body(Body::empty())
        .unwrap();
    let response = harness.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["meta"]["totalPages"], 1);
    assert_eq!(body["data"][0]["billingRate"], 80.0);
}

// =============================================================================
// Projects
// =============================================================================

#[tokio::test]
async fn test_unknown_project_status_filter_rejected() {
    let app = Harness::new().router();
    let token = token(Uuid::new_v4(), UserRole::Admin);
    let response = app
        .oneshot(request("GET", "/projects?status=PAUSED", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_employee_cannot_create_project() {
    let mut harness = Harness::new();
    harness
        .projects
        .expect_create_project()
        .returning(|_, _| Err(AppError::Forbidden));

    let token = token(Uuid::new_v4(), UserRole::Employee);
    let response = harness
        .router()
        .oneshot(request(
            "POST",
            "/projects",
            Some(&token),
            Some(json!({"name": "Website", "billingRate": 80})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_archiving_returns_archived_project() {
    let mut harness = Harness::new();
    harness.projects.expect_archive_project().returning(|_, _| {
        let mut p = project(ProjectStatus::Archived);
        p.archived_at = Some(Utc::now());
        Ok(p)
    });

    let token = token(Uuid::new_v4(), UserRole::Admin);
    let uri = format!("/projects/{}", Uuid::new_v4());
    let response = harness
        .router()
        .oneshot(request("DELETE", &uri, Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ARCHIVED");
    assert!(body["archivedAt"].is_string());
}

// =============================================================================
// Time Logs
// =============================================================================

#[tokio::test]
async fn test_quota_rejection_body() {
    let user_id = Uuid::new_v4();
    let mut harness = Harness::new();
    harness
        .time_logs
        .expect_create_time_log()
        .withf(move |actor, input| actor.id == user_id && input.user_id.is_none())
        .returning(|_, _| Err(AppError::QuotaExceeded { remaining: 1.0 }));

    let token = token(user_id, UserRole::Employee);
    let response = harness
        .router()
        .oneshot(request(
            "POST",
            "/time-logs",
            Some(&token),
            Some(json!({
                "projectId": Uuid::new_v4(),
                "hours": 2,
                "notes": "Frontend work",
                "logDate": "2025-01-16"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "DAILY_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["remainingHours"], 1.0);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("1 hours remaining"));
}

#[tokio::test]
async fn test_validation_rejection_lists_fields() {
    let mut harness = Harness::new();
    harness.time_logs.expect_create_time_log().returning(|_, _| {
        Err(AppError::Validation(vec![
            FieldError::new("hours", "Hours must be greater than 0"),
            FieldError::new("notes", "Notes must be at least 5 characters"),
        ]))
    });

    let token = token(Uuid::new_v4(), UserRole::Employee);
    let response = harness
        .router()
        .oneshot(request(
            "POST",
            "/time-logs",
            Some(&token),
            Some(json!({"projectId": Uuid::new_v4(), "hours": 0, "notes": "hi"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_created_log_returned_with_201() {
    let user_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    let mut harness = Harness::new();
    harness
        .time_logs
        .expect_create_time_log()
        .returning(move |actor, input| {
            let now = Utc::now();
            Ok(TimeLog {
                id: Uuid::new_v4(),
                project_id: input.project_id,
                user_id: actor.id,
                hours: 6.5,
                notes: "Frontend work".to_string(),
                log_date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
                status: TimeLogStatus::Todo,
                created_at: now,
                updated_at: now,
            })
        });

    let token = token(user_id, UserRole::Employee);
    let response = harness
        .router()
        .oneshot(request(
            "POST",
            "/time-logs",
            Some(&token),
            Some(json!({
                "projectId": project_id,
                "hours": "6.5",
                "notes": "Frontend work",
                "logDate": "2025-01-16"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["logDate"], "2025-01-16");
    assert_eq!(body["status"], "TODO");
    assert_eq!(body["userId"], user_id.to_string());
}

#[tokio::test]
async fn test_delete_returns_no_content() {
    let mut harness = Harness::new();
    harness
        .time_logs
        .expect_delete_time_log()
        .times(1)
        .returning(|_, _| Ok(()));

    let token = token(Uuid::new_v4(), UserRole::Admin);
    let uri = format!("/time-logs/{}", Uuid::new_v4());
    let response = harness
        .router()
        .oneshot(request("DELETE", &uri, Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_billing_summary_forbidden_for_employee() {
    let mut harness = Harness::new();
    harness
        .billing
        .expect_project_summary()
        .returning(|_, _| Err(AppError::Forbidden));

    let token = token(Uuid::new_v4(), UserRole::Employee);
    let uri = format!("/projects/{}/billing-summary", Uuid::new_v4());
    let response = harness
        .router()
        .oneshot(request("GET", &uri, Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_retry_after() {
    let mut harness = Harness::new();
    harness.max_requests = 2;
    let app = harness.router();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request("GET", "/projects", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    let response = app
        .oneshot(request("GET", "/projects", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");
    assert!(body["error"]["retryAfter"].as_u64().unwrap() <= 60);
}
