//! Service modules for the reconciliation engine
//!
//! Leaf-first: the normalizer and text differ feed the diff engine and track
//! matcher; scoring ranks candidates upstream; preview assembles a
//! `ReconciliationResult`; apply writes the operator's selections.

pub mod apply;
pub mod catalog_client;
pub mod diff_engine;
pub mod normalizer;
pub mod preview;
pub mod scoring;
pub mod text_diff;
pub mod track_matcher;

pub use apply::{ApplyError, ApplyService, RemovedTrackPolicy};
pub use catalog_client::{CatalogClient, CatalogError, MusicBrainzCatalog};
pub use preview::{PreviewError, PreviewService};
pub use scoring::{Scorer, ScoringStrategy};
pub use track_matcher::match_tracks;
