//! Time log entry validation.
//!
//! Pure shape checks on a submitted entry. Every violated field is reported,
//! not only the first one. Cross-entry rules (the daily cap) live in
//! [`crate::quota`].

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::constants::{DATE_FORMAT, MAX_HOURS_PER_ENTRY, MAX_NOTES_LENGTH, MIN_NOTES_LENGTH};
use crate::error::{DomainError, DomainResult, FieldErrors};
use crate::quota::quantize_hours;
use crate::time_log::{TimeLogChanges, TimeLogEntry, TimeLogStatus};

/// Hours as submitted: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HoursInput {
    Number(f64),
    Text(String),
}

impl From<f64> for HoursInput {
    fn from(value: f64) -> Self {
        HoursInput::Number(value)
    }
}

impl From<&str> for HoursInput {
    fn from(value: &str) -> Self {
        HoursInput::Text(value.to_string())
    }
}

/// Raw, unvalidated time log fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogDraft {
    pub hours: Option<HoursInput>,
    pub notes: Option<String>,
    pub log_date: Option<String>,
    pub status: Option<String>,
}

/// Validate a complete entry for creation.
///
/// `today` is the server's current calendar day; dates after it are
/// rejected. A missing status defaults to [`TimeLogStatus::Todo`].
pub fn validate_entry(draft: &TimeLogDraft, today: NaiveDate) -> DomainResult<TimeLogEntry> {
    let mut errors = FieldErrors::new();

    let hours = match &draft.hours {
        Some(raw) => check_hours(raw, &mut errors),
        None => {
            errors.push("hours", "Hours are required");
            None
        }
    };
    let notes = match &draft.notes {
        Some(raw) => check_notes(raw, &mut errors),
        None => {
            errors.push("notes", "Notes are required");
            None
        }
    };
    let log_date = match &draft.log_date {
        Some(raw) => check_log_date(raw, today, &mut errors),
        None => {
            errors.push("logDate", "Log date is required");
            None
        }
    };
    let status = match &draft.status {
        Some(raw) => check_status(raw, &mut errors),
        None => Some(TimeLogStatus::default()),
    };

    errors.check()?;

    match (hours, notes, log_date, status) {
        (Some(hours), Some(notes), Some(log_date), Some(status)) => Ok(TimeLogEntry {
            hours,
            notes,
            log_date,
            status,
        }),
        _ => Err(DomainError::internal("entry incomplete after validation")),
    }
}

/// Validate the supplied subset of fields for an update.
pub fn validate_changes(draft: &TimeLogDraft, today: NaiveDate) -> DomainResult<TimeLogChanges> {
    let mut errors = FieldErrors::new();

    let changes = TimeLogChanges {
        hours: draft
            .hours
            .as_ref()
            .and_then(|raw| check_hours(raw, &mut errors)),
        notes: draft
            .notes
            .as_deref()
            .and_then(|raw| check_notes(raw, &mut errors)),
        log_date: draft
            .log_date
            .as_deref()
            .and_then(|raw| check_log_date(raw, today, &mut errors)),
        status: draft
            .status
            .as_deref()
            .and_then(|raw| check_status(raw, &mut errors)),
    };

    errors.finish(changes)
}

fn check_hours(raw: &HoursInput, errors: &mut FieldErrors) -> Option<f64> {
    let parsed = match raw {
        HoursInput::Number(n) => Some(*n),
        HoursInput::Text(s) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(hours) if hours.is_finite() => {
            if hours <= 0.0 {
                errors.push("hours", "Hours must be positive");
                None
            } else if hours > MAX_HOURS_PER_ENTRY {
                errors.push(
                    "hours",
                    format!("Cannot log more than {} hours in one entry", MAX_HOURS_PER_ENTRY),
                );
                None
            } else {
                match quantize_hours(hours) {
                    h if h > 0.0 => Some(h),
                    _ => {
                        errors.push("hours", "Hours must be at least 0.01");
                        None
                    }
                }
            }
        }
        _ => {
            errors.push("hours", "Hours must be a number");
            None
        }
    }
}

fn check_notes(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len < MIN_NOTES_LENGTH {
        errors.push(
            "notes",
            format!("Notes must be at least {} characters", MIN_NOTES_LENGTH),
        );
        None
    } else if len > MAX_NOTES_LENGTH {
        errors.push(
            "notes",
            format!("Notes must be at most {} characters", MAX_NOTES_LENGTH),
        );
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn check_log_date(raw: &str, today: NaiveDate, errors: &mut FieldErrors) -> Option<NaiveDate> {
    match parse_log_date(raw) {
        Some(date) if date > today => {
            errors.push("logDate", "Log date cannot be in the future");
            None
        }
        Some(date) => Some(date),
        None => {
            errors.push("logDate", "Log date must be a valid date (YYYY-MM-DD)");
            None
        }
    }
}

fn check_status(raw: &str, errors: &mut FieldErrors) -> Option<TimeLogStatus> {
    let status = TimeLogStatus::parse(raw.trim());
    if status.is_none() {
        errors.push("status", "Status must be one of TODO, IN_PROGRESS, DONE");
    }
    status
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, whose
/// calendar date is taken in the offset it was written in.
pub fn parse_log_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
