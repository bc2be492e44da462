//! Preview assembly
//!
//! Loads the album snapshot, fetches the full candidate release from the
//! catalog, and runs every comparator to produce a `ReconciliationResult`.
//! The preview fails closed: if the catalog fetch fails, no partial result
//! is produced.

use crate::db::albums::load_album_with_tracks;
use crate::models::{AlbumRecord, ReconciliationResult, SourceRecord};
use crate::services::catalog_client::{CatalogClient, CatalogError};
use crate::services::diff_engine::{
    compare_artist_credits, compare_cover_art, diff_album, summarize,
};
use crate::services::track_matcher::match_tracks;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Preview failures
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Album not found: {0}")]
    AlbumNotFound(Uuid),

    #[error("Source data unavailable: {0}")]
    SourceUnavailable(#[from] CatalogError),

    #[error("Database error: {0}")]
    Database(#[from] tagfix_common::Error),
}

/// Builds reconciliation previews for (album, candidate) pairs
pub struct PreviewService<C> {
    db: SqlitePool,
    catalog: C,
}

impl<C: CatalogClient> PreviewService<C> {
    pub fn new(db: SqlitePool, catalog: C) -> Self {
        Self { db, catalog }
    }

    /// Produce a full reconciliation of the stored album against the given
    /// catalog release
    pub async fn generate_preview(
        &self,
        album_guid: Uuid,
        candidate_mbid: &str,
    ) -> Result<ReconciliationResult, PreviewError> {
        let album = load_album_with_tracks(&self.db, album_guid)
            .await?
            .ok_or(PreviewError::AlbumNotFound(album_guid))?;

        let source = self.catalog.fetch_full_candidate(candidate_mbid).await?;

        let result = build_reconciliation(album, source);

        info!(
            album_guid = %album_guid,
            candidate_mbid,
            changed_fields = result.summary.changed_fields,
            has_track_changes = result.summary.has_track_changes,
            "Preview generated"
        );

        Ok(result)
    }
}

/// Run every comparator over an already-loaded pair
///
/// Pure; separated from the service so the apply path and tests can build
/// results without a catalog round trip.
pub fn build_reconciliation(album: AlbumRecord, source: SourceRecord) -> ReconciliationResult {
    let field_diffs = diff_album(&album, &source);
    let artist_credit = compare_artist_credits(&album.artist_credits, &source.artist_credits);
    let cover_art = compare_cover_art(album.cover_art_url.as_deref(), source.cover_art_url.as_deref());
    let (track_diffs, track_summary) = match_tracks(&album.tracks, &source.tracks);
    let summary = summarize(&field_diffs, &artist_credit, &cover_art, &track_summary);

    ReconciliationResult {
        album,
        source,
        field_diffs,
        artist_credit,
        track_diffs,
        track_summary,
        cover_art,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtistCredit, ChangeClass, SourceTrack, TrackRecord};

    fn stored_album() -> AlbumRecord {
        AlbumRecord {
            guid: Uuid::new_v4(),
            title: "Abbey Road".to_string(),
            artist_credits: vec![ArtistCredit::new("The Beatles")],
            release_date: Some("1969".to_string()),
            country: None,
            barcode: None,
            labels: vec![],
            genres: vec!["Rock".to_string()],
            release_mbid: None,
            artist_mbid: None,
            cover_art_url: None,
            tracks: vec![TrackRecord {
                guid: Uuid::new_v4(),
                disc_number: 1,
                position: 1,
                title: "Come Together".to_string(),
                duration_ms: Some(259_000),
                recording_mbid: None,
            }],
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn catalog_release() -> SourceRecord {
        SourceRecord {
            release_mbid: "9162580e-5df4-32de-80cc-f45a8d8a9b1d".to_string(),
            title: "Abbey Road".to_string(),
            artist_credits: vec![ArtistCredit::new("The Beatles")],
            release_date: Some("1969-09-26".to_string()),
            country: Some("GB".to_string()),
            barcode: None,
            labels: vec!["Apple Records".to_string()],
            genres: vec!["Rock".to_string()],
            artist_mbid: None,
            cover_art_url: Some("https://coverartarchive.org/release/x/front".to_string()),
            tracks: vec![
                SourceTrack {
                    disc_number: 1,
                    position: 1,
                    title: "Come Together".to_string(),
                    duration_ms: Some(259_946),
                    recording_mbid: None,
                },
                SourceTrack {
                    disc_number: 1,
                    position: 2,
                    title: "Something".to_string(),
                    duration_ms: Some(182_293),
                    recording_mbid: None,
                },
            ],
        }
    }

    #[test]
    fn test_build_reconciliation_assembles_all_sections() {
        let result = build_reconciliation(stored_album(), catalog_release());

        // 8 typed field diffs, plus artist credit and cover art in the rollup
        assert_eq!(result.field_diffs.len(), 8);
        assert_eq!(result.summary.total_fields, 10);
        assert_eq!(result.track_diffs.len(), 2);
        assert_eq!(result.track_summary.matching, 1);
        assert_eq!(result.track_summary.added, 1);
        assert!(result.summary.has_track_changes);
        assert_eq!(result.cover_art.classification, ChangeClass::Added);
    }

    #[test]
    fn test_identical_pair_reports_nothing_changed() {
        let album = stored_album();
        let source = SourceRecord {
            release_mbid: "m".to_string(),
            title: album.title.clone(),
            artist_credits: album.artist_credits.clone(),
            release_date: album.release_date.clone(),
            country: None,
            barcode: None,
            labels: vec![],
            genres: album.genres.clone(),
            artist_mbid: None,
            cover_art_url: None,
            tracks: album
                .tracks
                .iter()
                .map(|t| SourceTrack {
                    disc_number: t.disc_number,
                    position: t.position,
                    title: t.title.clone(),
                    duration_ms: t.duration_ms,
                    recording_mbid: t.recording_mbid.clone(),
                })
                .collect(),
        };

        let result = build_reconciliation(album, source);

        // Only release_mbid differs (absent locally, always present remotely)
        assert_eq!(result.summary.changed_fields, 1);
        assert!(!result.summary.has_track_changes);
        assert_eq!(result.track_summary.matching, 1);
    }
}
