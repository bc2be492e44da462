//! Shared infrastructure for tagfix
//!
//! Error type, TOML configuration, and SQLite database initialization used by
//! the reconciliation engine.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
