//! Local and source record snapshots
//!
//! `AlbumRecord`/`TrackRecord` mirror the local store rows. `SourceRecord`/
//! `SourceTrack` are the strongly-typed form of an external catalog release,
//! produced by the catalog client's transformation step. Nothing loosely
//! typed crosses into the diff engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One credited artist with the phrase joining it to the next credit
/// (e.g. "A" + " & " + "B" renders as "A & B")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    /// Display name as credited on this release
    pub name: String,
    /// Connecting phrase to the following credit, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_phrase: Option<String>,
}

impl ArtistCredit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            join_phrase: None,
        }
    }
}

/// Render a credit list as a single display string, using each credit's join
/// phrase (", " when none is given)
pub fn render_artist_credits(credits: &[ArtistCredit]) -> String {
    let mut display = String::new();
    for (i, credit) in credits.iter().enumerate() {
        display.push_str(&credit.name);
        if i + 1 < credits.len() {
            match &credit.join_phrase {
                Some(phrase) => display.push_str(phrase),
                None => display.push_str(", "),
            }
        }
    }
    display
}

/// Locally stored album with its tracks and optimistic-lock token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub guid: Uuid,
    pub title: String,
    pub artist_credits: Vec<ArtistCredit>,
    /// Partial date as stored: YYYY, YYYY-MM, or YYYY-MM-DD
    pub release_date: Option<String>,
    pub country: Option<String>,
    pub barcode: Option<String>,
    pub labels: Vec<String>,
    pub genres: Vec<String>,
    pub release_mbid: Option<String>,
    pub artist_mbid: Option<String>,
    pub cover_art_url: Option<String>,
    pub tracks: Vec<TrackRecord>,
    /// Last-modified token; compared at apply time to detect stale previews
    pub updated_at: String,
}

/// Locally stored track row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub guid: Uuid,
    pub disc_number: u32,
    pub position: u32,
    pub title: String,
    pub duration_ms: Option<u32>,
    pub recording_mbid: Option<String>,
}

/// Fully fetched external catalog release, typed at the client boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub release_mbid: String,
    pub title: String,
    pub artist_credits: Vec<ArtistCredit>,
    pub release_date: Option<String>,
    pub country: Option<String>,
    pub barcode: Option<String>,
    pub labels: Vec<String>,
    pub genres: Vec<String>,
    pub artist_mbid: Option<String>,
    pub cover_art_url: Option<String>,
    pub tracks: Vec<SourceTrack>,
}

/// Track listing entry of a source release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTrack {
    pub disc_number: u32,
    pub position: u32,
    pub title: String,
    pub duration_ms: Option<u32>,
    pub recording_mbid: Option<String>,
}
