//! Middleware for authentication and rate limiting.

mod auth;
mod rate_limit;

pub use auth::{auth_middleware, Claims, CurrentUser, TokenVerifier};
pub use rate_limit::rate_limit_middleware;
