//! Time log entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserRef;

/// Workflow state of a time log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeLogStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TimeLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeLogStatus::Todo => "TODO",
            TimeLogStatus::InProgress => "IN_PROGRESS",
            TimeLogStatus::Done => "DONE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(TimeLogStatus::Todo),
            "IN_PROGRESS" => Some(TimeLogStatus::InProgress),
            "DONE" => Some(TimeLogStatus::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dated record of hours worked by a user on a project.
///
/// `project_id` and `user_id` are fixed at creation; no update path
/// carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub hours: f64,
    pub notes: String,
    pub log_date: NaiveDate,
    pub status: TimeLogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal project projection embedded in time log listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProjectRef {
    pub id: Uuid,
    pub name: String,
}

/// Time log joined with its author and project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeLogDetail {
    #[serde(flatten)]
    pub log: TimeLog,
    pub user: UserRef,
    pub project: ProjectRef,
}

/// Normalized, validated entry fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLogEntry {
    pub hours: f64,
    pub notes: String,
    pub log_date: NaiveDate,
    pub status: TimeLogStatus,
}

/// Data handed to the store when inserting a time log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeLog {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub entry: TimeLogEntry,
}

/// Validated partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLogChanges {
    pub hours: Option<f64>,
    pub notes: Option<String>,
    pub log_date: Option<NaiveDate>,
    pub status: Option<TimeLogStatus>,
}

impl TimeLogChanges {
    /// Hours or date changes require a fresh quota check.
    pub fn affects_quota(&self) -> bool {
        self.hours.is_some() || self.log_date.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_none()
            && self.notes.is_none()
            && self.log_date.is_none()
            && self.status.is_none()
    }

    /// Hours and date the log would have after applying these changes.
    pub fn resolve(&self, current: &TimeLog) -> (f64, NaiveDate) {
        (
            self.hours.unwrap_or(current.hours),
            self.log_date.unwrap_or(current.log_date),
        )
    }
}

/// Filters for listing time logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLogFilter {
    pub project_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<TimeLogStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(hours: f64, date: NaiveDate) -> TimeLog {
        let now = Utc::now();
        TimeLog {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            hours,
            notes: "Implemented login page".to_string(),
            log_date: date,
            status: TimeLogStatus::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TimeLogStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(TimeLogStatus::default(), TimeLogStatus::Todo);
        assert_eq!(TimeLogStatus::parse("APPROVED"), None);
    }

    #[test]
    fn test_changes_resolve_falls_back_to_current() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let current = log(5.0, day);

        let notes_only = TimeLogChanges {
            notes: Some("Reviewed pull requests".to_string()),
            ..Default::default()
        };
        assert!(!notes_only.affects_quota());
        assert_eq!(notes_only.resolve(&current), (5.0, day));

        let next = day.succ_opt().unwrap();
        let moved = TimeLogChanges {
            log_date: Some(next),
            ..Default::default()
        };
        assert!(moved.affects_quota());
        assert_eq!(moved.resolve(&current), (5.0, next));
    }

    #[test]
    fn test_log_serializes_camel_case_with_plain_date() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let value = serde_json::to_value(log(2.5, day)).unwrap();
        assert_eq!(value["logDate"], "2025-01-16");
        assert_eq!(value["hours"], 2.5);
        assert!(value.get("projectId").is_some());
    }
}
