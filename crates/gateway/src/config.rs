//! Gateway configuration.

use std::env;

use common::{env_or, JwtConfig, RateLimitConfig};
use domain::MIN_JWT_SECRET_LENGTH;
use thiserror::Error;
use timelog_service_lib::config::TimeLogServiceConfig;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error("JWT_SECRET must be at least {0} characters")]
    WeakJwtSecret(usize),
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Per-client request budget
    pub rate_limit: RateLimitConfig,
    /// Token verification secret
    pub jwt: JwtConfig,
    /// Embedded time log service settings
    pub service: TimeLogServiceConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RateLimitConfig::default();
        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;

        let config = Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("GATEWAY_PORT", 3000),
            rate_limit: RateLimitConfig {
                max_requests: env_or("RATE_LIMIT_REQUESTS", defaults.max_requests),
                window_seconds: env_or("RATE_LIMIT_WINDOW_SECONDS", defaults.window_seconds),
            },
            jwt: JwtConfig { secret },
            service: TimeLogServiceConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject secrets too short to sign tokens safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.chars().count() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::WeakJwtSecret(MIN_JWT_SECRET_LENGTH));
        }
        Ok(())
    }
}
