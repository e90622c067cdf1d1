//! Project entity and its status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_BILLING_RATE, MAX_PROJECT_NAME_LENGTH, MIN_PROJECT_NAME_LENGTH};
use crate::error::{DomainError, DomainResult, FieldErrors};

/// Project workflow status. `Archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ProjectStatus::Active),
            "COMPLETED" => Some(ProjectStatus::Completed),
            "ARCHIVED" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Archived)
    }

    /// Whether a project in this status may move to `next`.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        !self.is_terminal() || next == ProjectStatus::Archived
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Currency per hour, read at aggregation time
    pub billing_rate: f64,
    pub status: ProjectStatus,
    /// Set once on the archive transition, never cleared
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_archived(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, stamping `archived_at` on the first archive.
    ///
    /// Archiving an archived project is a no-op that keeps the original
    /// timestamp.
    pub fn transition_to(&mut self, next: ProjectStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(format!(
                "Project is {} and cannot become {}",
                self.status, next
            )));
        }

        if next == ProjectStatus::Archived && self.archived_at.is_none() {
            self.archived_at = Some(now);
        }
        if self.status != next {
            self.status = next;
            self.updated_at = now;
        }
        Ok(())
    }

    /// Apply a validated patch, enforcing the status lifecycle.
    pub fn apply(&mut self, patch: ProjectPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(status) = patch.status {
            self.transition_to(status, now)?;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(rate) = patch.billing_rate {
            self.billing_rate = rate;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Validated data for a new project.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub billing_rate: f64,
    pub status: ProjectStatus,
}

impl NewProject {
    /// Validate raw creation input. Status defaults to `Active`.
    pub fn validate(
        name: &str,
        description: Option<String>,
        billing_rate: Option<f64>,
        status: Option<ProjectStatus>,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let name = check_name(name, &mut errors);
        match billing_rate {
            Some(rate) => check_billing_rate(rate, &mut errors),
            None => errors.push("billingRate", "Billing rate is required"),
        }

        errors.finish(Self {
            name,
            description: normalize_description(description),
            billing_rate: billing_rate.unwrap_or_default(),
            status: status.unwrap_or_default(),
        })
    }
}

/// Validated partial update of a project.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub billing_rate: Option<f64>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn validate(
        name: Option<&str>,
        description: Option<Option<String>>,
        billing_rate: Option<f64>,
        status: Option<ProjectStatus>,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let name = name.map(|n| check_name(n, &mut errors));
        if let Some(rate) = billing_rate {
            check_billing_rate(rate, &mut errors);
        }

        errors.finish(Self {
            name,
            description: description.map(normalize_description),
            billing_rate,
            status,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.billing_rate.is_none()
            && self.status.is_none()
    }
}

/// Status selection for project listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectStatusFilter {
    /// Everything except archived projects
    #[default]
    Unarchived,
    All,
    Only(ProjectStatus),
}

impl ProjectStatusFilter {
    /// Parse the `status` query value; `ALL` selects every status.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(ProjectStatusFilter::Unarchived),
            Some("ALL") => Some(ProjectStatusFilter::All),
            Some(s) => ProjectStatus::parse(s).map(ProjectStatusFilter::Only),
        }
    }

    pub fn matches(&self, status: ProjectStatus) -> bool {
        match self {
            ProjectStatusFilter::Unarchived => !status.is_terminal(),
            ProjectStatusFilter::All => true,
            ProjectStatusFilter::Only(only) => *only == status,
        }
    }
}

/// Filters for listing projects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub status: ProjectStatusFilter,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

fn check_name(name: &str, errors: &mut FieldErrors) -> String {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < MIN_PROJECT_NAME_LENGTH {
        errors.push("name", "Name is required");
    } else if len > MAX_PROJECT_NAME_LENGTH {
        errors.push(
            "name",
            format!("Name must be at most {} characters", MAX_PROJECT_NAME_LENGTH),
        );
    }
    trimmed.to_string()
}

fn check_billing_rate(rate: f64, errors: &mut FieldErrors) {
    if !rate.is_finite() || rate < 0.0 {
        errors.push("billingRate", "Billing rate must be a non-negative number");
    } else if rate > MAX_BILLING_RATE {
        errors.push(
            "billingRate",
            format!("Billing rate cannot exceed {}", MAX_BILLING_RATE),
        );
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
