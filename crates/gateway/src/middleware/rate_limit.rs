//! Rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use common::AppError;

use crate::state::AppState;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Fixed-window rate limit per client IP.
///
/// Fails closed: a store error denies the request.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let max_requests = state.config.rate_limit.max_requests;
    let window_seconds = state.config.rate_limit.window_seconds;
    let ip = client_ip(request.headers(), connect_info);

    let status = match state
        .cache
        .check_rate_limit(&ip, max_requests, window_seconds)
        .await
    {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(ip = %ip, error = %e, "Rate limit check failed");
            return too_many_requests(max_requests, window_seconds);
        }
    };

    if !status.allowed {
        tracing::warn!(ip = %ip, count = status.count, "Rate limit exceeded");
        return too_many_requests(max_requests, status.reset_seconds);
    }

    let mut response = next.run(request).await;
    set_limit_headers(
        response.headers_mut(),
        max_requests,
        max_requests.saturating_sub(status.count),
        status.reset_seconds,
    );
    response
}

fn client_ip(headers: &HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    if let Some(ip) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u64, remaining: u64, reset: u64) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset));
}

fn too_many_requests(max_requests: u64, retry_after: u64) -> Response {
    let error = AppError::TooManyRequests;
    let body = json!({
        "error": {
            "code": error.code(),
            "message": error.user_message(),
            "retryAfter": retry_after,
        }
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    set_limit_headers(headers, max_requests, 0, retry_after);
    response
}
