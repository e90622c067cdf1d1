//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Actor, UserRole, AUTH_COOKIE_NAME, BEARER_TOKEN_PREFIX};

use crate::state::AppState;

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies HS256 tokens issued with the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Decode and check signature and expiry
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Identity handed to the core services
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&claims.role).ok_or(AppError::Unauthorized)?;
        Ok(Self {
            id: claims.sub,
            email: claims.email,
            role,
        })
    }
}

/// JWT authentication middleware.
///
/// Accepts a bearer token or the `auth-token` cookie and injects the
/// [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        AppError::Unauthorized
    })?;
    let current_user = CurrentUser::try_from(claims)?;

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}
