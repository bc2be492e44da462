//! Candidate scoring value types

use serde::{Deserialize, Serialize};

/// Raw external search result, typed at the catalog-client boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub release_mbid: String,
    pub title: String,
    pub artist_name: String,
    /// Partial date string as reported by the catalog
    pub release_date: Option<String>,
    pub country: Option<String>,
    pub track_count: Option<u32>,
    /// Catalog's own search relevance score, 0-100 when reported
    pub source_score: Option<u32>,
}

/// Per-signal score breakdown, each on [0.0, 1.0]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub title_score: f64,
    pub artist_score: f64,
    pub year_score: f64,
    pub source_score: f64,
}

/// A ranked candidate with its normalized confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: RawCandidate,
    /// Normalized confidence, always on [0.0, 1.0]
    pub normalized_score: f64,
    /// Integer percent for display (rounded)
    pub display_score: u32,
    pub breakdown: ScoreBreakdown,
    /// Below the configured confidence threshold
    pub is_low_confidence: bool,
    /// Strategy name that produced this score
    pub strategy: &'static str,
}
