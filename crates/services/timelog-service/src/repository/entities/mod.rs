//! SeaORM entity definitions.

pub mod project;
pub mod time_log;
pub mod user;
