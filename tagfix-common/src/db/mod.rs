//! Database infrastructure
//!
//! Connection pool setup and idempotent schema creation for the tagfix
//! SQLite store.

pub mod init;

pub use init::init_database;
