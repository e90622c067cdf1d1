//! HTTP handlers.

pub mod health_handler;
pub mod project_handler;
pub mod time_log_handler;

pub use health_handler::health_routes;
pub use project_handler::project_routes;
pub use time_log_handler::time_log_routes;
