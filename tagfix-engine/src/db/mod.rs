//! Album and audit persistence operations
//!
//! Read paths take a pool; write paths take a transaction connection so the
//! apply service can compose them into one atomic unit.

pub mod albums;
pub mod audit;
