//! Domain layer - Core business entities and rules.
//!
//! Pure time tracking and billing logic with no infrastructure dependencies:
//! entry validation, the daily hour cap, billing aggregation and the access
//! policy. Persistence and transport live in the service and gateway crates.

pub mod billing;
pub mod constants;
pub mod error;
pub mod policy;
pub mod project;
pub mod quota;
pub mod time_log;
pub mod user;
pub mod validation;

pub use billing::{summarize, BillingSummary, DateHours, UserHours};
pub use constants::*;
pub use error::{DomainError, DomainResult, FieldError, FieldErrors};
pub use policy::{authorize, authorize_on_time_log, can_modify_time_log, has_permission, Action};
pub use project::{
    NewProject, Project, ProjectFilter, ProjectPatch, ProjectStatus, ProjectStatusFilter,
};
pub use quota::{check_daily_cap, logged_hours, quantize_hours, quota_key, remaining_allowance};
pub use time_log::{
    NewTimeLog, ProjectRef, TimeLog, TimeLogChanges, TimeLogDetail, TimeLogEntry, TimeLogFilter,
    TimeLogStatus,
};
pub use user::{Actor, User, UserRef, UserRole};
pub use validation::{parse_log_date, validate_changes, validate_entry, HoursInput, TimeLogDraft};
