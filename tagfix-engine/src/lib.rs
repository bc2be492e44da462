//! tagfix reconciliation engine
//!
//! Reconciles locally stored album records against candidate records from an
//! external catalog, produces field-level diffs for operator review, ranks
//! search candidates, and applies the accepted subset of differences as one
//! atomic, optimistically-locked, audited write.
//!
//! The engine is a library boundary: no HTTP surface, no UI. Callers drive it
//! through three operations:
//!
//! - [`services::preview::PreviewService::generate_preview`] builds a
//!   [`models::ReconciliationResult`] for an (album, candidate) pair
//! - [`services::scoring::Scorer::rank`] ranks raw catalog search results
//! - [`services::apply::ApplyService::apply_correction`] applies the
//!   operator's selections in a single transaction
//!
//! Diffing, matching, and scoring are pure functions over immutable inputs
//! and are safe to call from any number of concurrent tasks. Only the apply
//! path touches the store, and it holds no state between calls.

pub mod db;
pub mod models;
pub mod services;

pub use models::{
    AlbumField, AppliedChanges, ApplyOutcome, ChangeClass, FieldDiff, FieldSelections,
    ReconciliationResult, ScoredCandidate,
};
pub use services::apply::{ApplyError, ApplyService};
pub use services::preview::{PreviewError, PreviewService};
pub use services::scoring::{Scorer, ScoringStrategy};
