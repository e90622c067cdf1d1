//! Common utilities shared across the workspace crates.
//!
//! This crate provides:
//! - Unified HTTP error handling
//! - Configuration structures
//! - Pagination types for list endpoints

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, ErrorBody, ErrorResponse, OptionExt};
pub use pagination::{PageParams, Paginated, PaginationMeta};
