//! CLI commands

pub mod get;
pub mod query;
pub mod show;
pub mod validate;
