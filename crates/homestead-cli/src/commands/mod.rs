//! Subcommand handlers

pub mod config;
pub mod export;
pub mod history;
pub mod import;
pub mod record;
pub mod scopes;
pub mod status;
