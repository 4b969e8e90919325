//! CLI command handlers
//!
//! Each subcommand of the `feedback` binary is implemented in its own module.
//! Handlers share a [`context::Context`] holding the loaded configuration,
//! the session and the HTTP client.

pub mod auth;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod export;
pub mod facets;
pub mod notes;
pub mod render;
pub mod submit;
