//! Candidate scoring and ranking
//!
//! Ranks raw catalog search results against the operator's query text and
//! tags low-confidence matches. Three interchangeable strategies; all are
//! pure functions producing a normalized confidence on [0.0, 1.0].

use crate::models::{RawCandidate, ScoreBreakdown, ScoredCandidate};
use crate::services::normalizer::{are_equal, normalize, parse_date_components};
use tagfix_common::config::ScoringConfig;
use tagfix_common::{Error, Result};

/// Candidates scoring below this are tagged low-confidence unless configured
/// otherwise
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Similarity tier used by the tiered strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    None,
    Low,
    Medium,
    High,
}

impl Tier {
    /// Bucket a similarity score by fixed thresholds
    fn from_similarity(similarity: f64) -> Self {
        if similarity >= 0.9 {
            Tier::High
        } else if similarity >= 0.7 {
            Tier::Medium
        } else if similarity >= 0.4 {
            Tier::Low
        } else {
            Tier::None
        }
    }

    /// Fixed normalized value of each tier
    fn normalized(self) -> f64 {
        match self {
            Tier::High => 1.0,
            Tier::Medium => 0.7,
            Tier::Low => 0.4,
            Tier::None => 0.1,
        }
    }
}

/// Scoring strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    /// Weighted average of title/artist similarity and year presence
    Normalized,
    /// Per-side similarity tiers combined pessimistically
    Tiered,
    /// Explicit point budget (title 40, artist 40, year 10, relevance 10)
    Weighted,
}

impl ScoringStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normalized" => Some(ScoringStrategy::Normalized),
            "tiered" => Some(ScoringStrategy::Tiered),
            "weighted" => Some(ScoringStrategy::Weighted),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScoringStrategy::Normalized => "normalized",
            ScoringStrategy::Tiered => "tiered",
            ScoringStrategy::Weighted => "weighted",
        }
    }
}

/// Candidate scorer
///
/// Construct once (strategy + threshold are fixed per configuration) and use
/// from any number of tasks; scoring holds no state.
#[derive(Debug, Clone)]
pub struct Scorer {
    strategy: ScoringStrategy,
    low_confidence_threshold: f64,
}

impl Scorer {
    pub fn new(strategy: ScoringStrategy, low_confidence_threshold: f64) -> Self {
        Self {
            strategy,
            low_confidence_threshold,
        }
    }

    /// Build a scorer from configuration
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let strategy = ScoringStrategy::from_name(&config.strategy).ok_or_else(|| {
            Error::Config(format!("Unknown scoring strategy '{}'", config.strategy))
        })?;
        Ok(Self::new(strategy, config.low_confidence_threshold))
    }

    /// Score one candidate against the operator's query
    pub fn score(
        &self,
        candidate: &RawCandidate,
        album_query: &str,
        artist_query: Option<&str>,
    ) -> ScoredCandidate {
        let (normalized_score, breakdown) = match self.strategy {
            ScoringStrategy::Normalized => score_normalized(candidate, album_query, artist_query),
            ScoringStrategy::Tiered => score_tiered(candidate, album_query, artist_query),
            ScoringStrategy::Weighted => score_weighted(candidate, album_query, artist_query),
        };

        let normalized_score = normalized_score.clamp(0.0, 1.0);

        ScoredCandidate {
            candidate: candidate.clone(),
            normalized_score,
            display_score: (normalized_score * 100.0).round() as u32,
            breakdown,
            is_low_confidence: normalized_score < self.low_confidence_threshold,
            strategy: self.strategy.name(),
        }
    }

    /// Score and rank candidates, highest confidence first
    ///
    /// The sort is stable, so equal scores keep their input order (the
    /// catalog's own relevance ordering).
    pub fn rank(
        &self,
        candidates: &[RawCandidate],
        album_query: &str,
        artist_query: Option<&str>,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|c| self.score(c, album_query, artist_query))
            .collect();

        scored.sort_by(|a, b| {
            b.normalized_score
                .partial_cmp(&a.normalized_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            strategy = self.strategy.name(),
            candidates = scored.len(),
            top_score = ?scored.first().map(|c| c.normalized_score),
            "Ranked candidates"
        );

        scored
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(
            ScoringStrategy::Weighted,
            DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        )
    }
}

/// Jaro-Winkler similarity over normalized text
fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&normalize(a), &normalize(b))
}

/// Whether the candidate reports a parseable release year
fn has_year(candidate: &RawCandidate) -> bool {
    candidate
        .release_date
        .as_deref()
        .and_then(parse_date_components)
        .is_some()
}

/// Normalized strategy: weighted average of title similarity, artist
/// similarity (boosted 20% on an exact normalized match, capped at 1.0), and
/// a binary year-presence signal
fn score_normalized(
    candidate: &RawCandidate,
    album_query: &str,
    artist_query: Option<&str>,
) -> (f64, ScoreBreakdown) {
    let title_score = similarity(album_query, &candidate.title);
    let year_score = if has_year(candidate) { 1.0 } else { 0.0 };

    match artist_query {
        Some(artist) => {
            let raw = similarity(artist, &candidate.artist_name);
            let artist_score = if are_equal(artist, &candidate.artist_name) {
                (raw * 1.2).min(1.0)
            } else {
                raw
            };
            let score = title_score * 0.5 + artist_score * 0.4 + year_score * 0.1;
            (
                score,
                ScoreBreakdown {
                    title_score,
                    artist_score,
                    year_score,
                    source_score: 0.0,
                },
            )
        }
        None => {
            let score = title_score * 0.8 + year_score * 0.2;
            (
                score,
                ScoreBreakdown {
                    title_score,
                    artist_score: 0.0,
                    year_score,
                    source_score: 0.0,
                },
            )
        }
    }
}

/// Tiered strategy: bucket title and artist similarity into tiers; the
/// combined tier downgrades to the weaker side unless both are High
fn score_tiered(
    candidate: &RawCandidate,
    album_query: &str,
    artist_query: Option<&str>,
) -> (f64, ScoreBreakdown) {
    let title_score = strsim::normalized_levenshtein(
        &normalize(album_query),
        &normalize(&candidate.title),
    );
    let title_tier = Tier::from_similarity(title_score);

    let (combined, artist_score) = match artist_query {
        Some(artist) => {
            let artist_score = strsim::normalized_levenshtein(
                &normalize(artist),
                &normalize(&candidate.artist_name),
            );
            let artist_tier = Tier::from_similarity(artist_score);
            // Both High stays High; anything else drops to the weaker side
            let combined = if title_tier == Tier::High && artist_tier == Tier::High {
                Tier::High
            } else {
                title_tier.min(artist_tier)
            };
            (combined, artist_score)
        }
        None => (title_tier, 0.0),
    };

    (
        combined.normalized(),
        ScoreBreakdown {
            title_score,
            artist_score,
            year_score: 0.0,
            source_score: 0.0,
        },
    )
}

/// Weighted strategy: explicit point budget scaled by similarity ratios
///
/// Title 40 + artist 40 + year 10 + catalog relevance 10 = 100 max; without
/// an artist query the artist component is excluded and the max is 60.
fn score_weighted(
    candidate: &RawCandidate,
    album_query: &str,
    artist_query: Option<&str>,
) -> (f64, ScoreBreakdown) {
    let title_score = similarity(album_query, &candidate.title);
    let year_score = if has_year(candidate) { 1.0 } else { 0.0 };
    let source_score = f64::from(candidate.source_score.unwrap_or(0).min(100)) / 100.0;

    let mut points = title_score * 40.0 + year_score * 10.0 + source_score * 10.0;
    let mut max_points = 60.0;

    let artist_score = match artist_query {
        Some(artist) => {
            let artist_score = similarity(artist, &candidate.artist_name);
            points += artist_score * 40.0;
            max_points += 40.0;
            artist_score
        }
        None => 0.0,
    };

    (
        points / max_points,
        ScoreBreakdown {
            title_score,
            artist_score,
            year_score,
            source_score,
        },
    )
}
