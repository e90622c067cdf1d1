//! Role based access policy.
//!
//! A fixed role to action table plus the ownership rule for time logs.
//! Everything here is a pure function of its inputs.

use std::fmt;

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::user::{Actor, UserRole};

/// Operations gated by the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ProjectCreate,
    ProjectUpdate,
    ProjectDelete,
    ProjectArchive,
    ProjectView,
    TimeLogCreate,
    TimeLogUpdateOwn,
    TimeLogDeleteOwn,
    TimeLogUpdateAny,
    TimeLogDeleteAny,
    TimeLogViewOwn,
    TimeLogViewAny,
    BillingView,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::ProjectCreate,
        Action::ProjectUpdate,
        Action::ProjectDelete,
        Action::ProjectArchive,
        Action::ProjectView,
        Action::TimeLogCreate,
        Action::TimeLogUpdateOwn,
        Action::TimeLogDeleteOwn,
        Action::TimeLogUpdateAny,
        Action::TimeLogDeleteAny,
        Action::TimeLogViewOwn,
        Action::TimeLogViewAny,
        Action::BillingView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ProjectCreate => "project:create",
            Action::ProjectUpdate => "project:update",
            Action::ProjectDelete => "project:delete",
            Action::ProjectArchive => "project:archive",
            Action::ProjectView => "project:view",
            Action::TimeLogCreate => "timelog:create",
            Action::TimeLogUpdateOwn => "timelog:update:own",
            Action::TimeLogDeleteOwn => "timelog:delete:own",
            Action::TimeLogUpdateAny => "timelog:update:any",
            Action::TimeLogDeleteAny => "timelog:delete:any",
            Action::TimeLogViewOwn => "timelog:view:own",
            Action::TimeLogViewAny => "timelog:view:any",
            Action::BillingView => "billing:view",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `role` is allowed to perform `action`.
pub fn has_permission(role: UserRole, action: Action) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Employee => match action {
            Action::ProjectView
            | Action::TimeLogCreate
            | Action::TimeLogUpdateOwn
            | Action::TimeLogDeleteOwn
            | Action::TimeLogViewOwn => true,
            Action::ProjectCreate
            | Action::ProjectUpdate
            | Action::ProjectDelete
            | Action::ProjectArchive
            | Action::TimeLogUpdateAny
            | Action::TimeLogDeleteAny
            | Action::TimeLogViewAny
            | Action::BillingView => false,
        },
    }
}

/// Whether the acting user may modify a time log owned by `owner`.
pub fn can_modify_time_log(role: UserRole, acting_user_id: Uuid, owner_user_id: Uuid) -> bool {
    role.is_admin() || acting_user_id == owner_user_id
}

/// Fails with [`DomainError::Forbidden`] unless the actor's role allows `action`.
pub fn authorize(actor: &Actor, action: Action) -> DomainResult<()> {
    if has_permission(actor.role, action) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Gate an operation on an existing time log owned by `owner`.
///
/// `own` and `any` are the table actions for the own and any-owner
/// variants of the operation.
pub fn authorize_on_time_log(actor: &Actor, owner: Uuid, own: Action, any: Action) -> DomainResult<()> {
    let action = if actor.id == owner { own } else { any };
    authorize(actor, action)?;
    if !can_modify_time_log(actor.role, actor.id, owner) {
        return Err(DomainError::Forbidden);
    }
    Ok(())
}
