//! Repository layer for data access.

pub mod entities;
mod project_repository;
mod time_log_repository;
mod user_repository;

pub use project_repository::{ProjectRepository, ProjectStore};
pub use time_log_repository::{TimeLogRepository, TimeLogStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use project_repository::MockProjectRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use time_log_repository::MockTimeLogRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
