//! Service layer - authorization, validation and orchestration.

mod billing_service;
mod project_service;
mod quota;
mod time_log_service;

pub use billing_service::{BillingReporter, BillingService};
pub use project_service::{ProjectChanges, ProjectInput, ProjectManager, ProjectService};
pub use quota::QuotaEnforcer;
pub use time_log_service::{CreateTimeLog, TimeLogManager, TimeLogService};

#[cfg(any(test, feature = "test-utils"))]
pub use billing_service::MockBillingService;
#[cfg(any(test, feature = "test-utils"))]
pub use project_service::MockProjectService;
#[cfg(any(test, feature = "test-utils"))]
pub use time_log_service::MockTimeLogService;
