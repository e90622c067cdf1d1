//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, database).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated field in a submitted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Name of the offending field as it appears on the wire
    pub field: String,
    /// Human readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// One or more fields failed validation
    #[error("Validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<FieldError>),

    /// Accepting the entry would push the day's total over the daily cap
    #[error("Daily limit exceeded: {remaining} hours remaining")]
    QuotaExceeded { remaining: f64 },

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Forbidden action
    #[error("Forbidden")]
    Forbidden,

    /// Status change not permitted by the entity lifecycle
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Internal domain error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Create a validation error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>) -> Self {
        DomainError::NotFound(entity.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        DomainError::InvalidTransition(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Accumulates field errors so every violated field is reported at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> DomainResult<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(DomainError::Validation(self.0))
        }
    }

    /// Fails with the recorded errors, if any.
    pub fn check(self) -> DomainResult<()> {
        self.finish(())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = DomainError::Validation(vec![
            FieldError::new("hours", "Hours must be positive"),
            FieldError::new("notes", "Notes are required"),
        ]);

        assert_eq!(
            err.to_string(),
            "Validation failed: hours: Hours must be positive, notes: Notes are required"
        );
    }

    #[test]
    fn test_field_errors_finish() {
        let errors = FieldErrors::new();
        assert_eq!(errors.finish(7).unwrap(), 7);

        let mut errors = FieldErrors::new();
        errors.push("logDate", "Invalid date");
        assert!(!errors.is_empty());
        match errors.check() {
            Err(DomainError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "logDate");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
