//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Role with full administrative privileges
pub const ROLE_ADMIN: &str = "ADMIN";

/// Role limited to its own time logs
pub const ROLE_EMPLOYEE: &str = "EMPLOYEE";

// =============================================================================
// Time Logging
// =============================================================================

/// Maximum hours accepted for a single time log entry
pub const MAX_HOURS_PER_ENTRY: f64 = 12.0;

/// Maximum hours a user may log across all entries of one calendar day
pub const DAILY_HOURS_CAP: f64 = 12.0;

/// Hours are stored in hundredths of an hour
pub const HOURS_SCALE: f64 = 100.0;

/// Minimum trimmed length of time log notes
pub const MIN_NOTES_LENGTH: usize = 5;

/// Maximum trimmed length of time log notes
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Calendar date format used on the wire and as grouping key
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Projects
// =============================================================================

/// Minimum project name length
pub const MIN_PROJECT_NAME_LENGTH: usize = 1;

/// Maximum project name length
pub const MAX_PROJECT_NAME_LENGTH: usize = 200;

/// Highest billing rate (currency per hour) a project may carry
pub const MAX_BILLING_RATE: f64 = 10_000.0;

// =============================================================================
// Authentication
// =============================================================================

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Cookie carrying the session token for browser clients
pub const AUTH_COOKIE_NAME: &str = "auth-token";
