//! External catalog client
//!
//! Fetches candidate releases from a MusicBrainz-compatible web service. The
//! raw JSON payloads are deserialized into explicit DTO structs and
//! transformed into the strongly-typed `RawCandidate`/`SourceRecord` domain
//! shapes at this boundary, so loosely-typed external data never reaches the
//! diff engine.
//!
//! Retry, rate limiting, and caching are the embedding application's
//! concern, not this client's.

use crate::models::{ArtistCredit, RawCandidate, SourceRecord, SourceTrack};
use serde::Deserialize;
use std::time::Duration;
use tagfix_common::config::CatalogConfig;
use thiserror::Error;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("Catalog rate limit exceeded")]
    RateLimited,

    #[error("Catalog API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Narrow interface the preview service depends on
///
/// Implemented by [`MusicBrainzCatalog`] for production and by in-memory
/// stubs in tests.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    /// Search for candidate releases matching a free-text query
    async fn search_candidates(&self, query: &str) -> Result<Vec<RawCandidate>, CatalogError>;

    /// Fetch one release in full, including its complete track listing
    async fn fetch_full_candidate(&self, release_mbid: &str)
        -> Result<SourceRecord, CatalogError>;
}

// ---------------------------------------------------------------------------
// Wire DTOs (MusicBrainz /ws/2 JSON shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MbReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<MbReleaseSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseSearchEntry {
    id: String,
    title: String,
    /// Catalog's own relevance score, 0-100
    score: Option<u32>,
    date: Option<String>,
    country: Option<String>,
    #[serde(rename = "track-count")]
    track_count: Option<u32>,
    #[serde(rename = "artist-credit")]
    artist_credit: Option<Vec<MbArtistCredit>>,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    name: String,
    #[serde(default)]
    joinphrase: Option<String>,
    artist: Option<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    id: String,
    #[allow(dead_code)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    id: String,
    title: String,
    date: Option<String>,
    country: Option<String>,
    barcode: Option<String>,
    #[serde(rename = "artist-credit")]
    artist_credit: Option<Vec<MbArtistCredit>>,
    #[serde(rename = "label-info", default)]
    label_info: Vec<MbLabelInfo>,
    #[serde(default)]
    genres: Vec<MbGenre>,
    #[serde(default)]
    media: Vec<MbMedium>,
    #[serde(rename = "cover-art-archive")]
    cover_art_archive: Option<MbCoverArtArchive>,
}

#[derive(Debug, Deserialize)]
struct MbLabelInfo {
    label: Option<MbLabel>,
}

#[derive(Debug, Deserialize)]
struct MbLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MbMedium {
    position: Option<u32>,
    #[serde(default)]
    tracks: Vec<MbTrack>,
}

#[derive(Debug, Deserialize)]
struct MbTrack {
    position: Option<u32>,
    title: String,
    length: Option<u64>,
    recording: Option<MbRecordingRef>,
}

#[derive(Debug, Deserialize)]
struct MbRecordingRef {
    id: String,
    length: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MbCoverArtArchive {
    #[serde(default)]
    front: bool,
}

// ---------------------------------------------------------------------------
// DTO → domain transformation
// ---------------------------------------------------------------------------

fn credits_from_dto(credits: &[MbArtistCredit]) -> Vec<ArtistCredit> {
    credits
        .iter()
        .map(|c| ArtistCredit {
            name: c.name.clone(),
            join_phrase: c.joinphrase.clone().filter(|p| !p.is_empty()),
        })
        .collect()
}

fn candidate_from_search(entry: MbReleaseSearchEntry) -> RawCandidate {
    let artist_name = entry
        .artist_credit
        .as_deref()
        .map(credits_from_dto)
        .map(|credits| crate::models::record::render_artist_credits(&credits))
        .unwrap_or_default();

    RawCandidate {
        release_mbid: entry.id,
        title: entry.title,
        artist_name,
        release_date: entry.date,
        country: entry.country,
        track_count: entry.track_count,
        source_score: entry.score,
    }
}

fn source_record_from_release(release: MbRelease, cover_art_base: &str) -> SourceRecord {
    let artist_credits = release
        .artist_credit
        .as_deref()
        .map(credits_from_dto)
        .unwrap_or_default();

    let artist_mbid = release
        .artist_credit
        .as_deref()
        .and_then(|credits| credits.first())
        .and_then(|c| c.artist.as_ref())
        .map(|a| a.id.clone());

    let labels = release
        .label_info
        .iter()
        .filter_map(|info| info.label.as_ref().map(|l| l.name.clone()))
        .collect();

    let genres = release.genres.iter().map(|g| g.name.clone()).collect();

    let mut tracks = Vec::new();
    for (medium_index, medium) in release.media.iter().enumerate() {
        let disc_number = medium.position.unwrap_or(medium_index as u32 + 1);
        for (track_index, track) in medium.tracks.iter().enumerate() {
            // Track length falls back to the recording length when unset
            let duration_ms = track
                .length
                .or_else(|| track.recording.as_ref().and_then(|r| r.length))
                .map(|ms| ms.min(u64::from(u32::MAX)) as u32);

            tracks.push(SourceTrack {
                disc_number,
                position: track.position.unwrap_or(track_index as u32 + 1),
                title: track.title.clone(),
                duration_ms,
                recording_mbid: track.recording.as_ref().map(|r| r.id.clone()),
            });
        }
    }

    let cover_art_url = match &release.cover_art_archive {
        Some(caa) if caa.front => Some(format!("{}/release/{}/front", cover_art_base, release.id)),
        _ => None,
    };

    SourceRecord {
        release_mbid: release.id,
        title: release.title,
        artist_credits,
        release_date: release.date,
        country: release.country,
        barcode: release.barcode,
        labels,
        genres,
        artist_mbid,
        cover_art_url,
        tracks,
    }
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

const COVER_ART_BASE_URL: &str = "https://coverartarchive.org";
const SEARCH_LIMIT: u32 = 25;

/// MusicBrainz web-service client
pub struct MusicBrainzCatalog {
    http_client: reqwest::Client,
    base_url: String,
}

impl MusicBrainzCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search request with the query encoded by reqwest
    fn search_request(&self, query: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}/release", self.base_url))
            .query(&[("query", query), ("fmt", "json")])
            .query(&[("limit", SEARCH_LIMIT)])
    }

    /// Full-release lookup request
    ///
    /// The inc list is space-separated; reqwest's form encoding turns the
    /// spaces into the `+` separators the web service expects.
    fn lookup_request(&self, release_mbid: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}/release/{}", self.base_url, release_mbid))
            .query(&[
                ("inc", "recordings artist-credits labels genres"),
                ("fmt", "json"),
            ])
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        not_found: impl FnOnce() -> CatalogError,
    ) -> Result<T, CatalogError> {
        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(url = %response.url(), status = %status, "Catalog response");

        if status.as_u16() == 404 {
            return Err(not_found());
        }
        if status.as_u16() == 503 {
            return Err(CatalogError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

impl CatalogClient for MusicBrainzCatalog {
    async fn search_candidates(&self, query: &str) -> Result<Vec<RawCandidate>, CatalogError> {
        let response: MbReleaseSearchResponse = self
            .get_json(self.search_request(query), || {
                CatalogError::Api(404, "search endpoint".into())
            })
            .await?;

        let candidates: Vec<RawCandidate> = response
            .releases
            .into_iter()
            .map(candidate_from_search)
            .collect();

        tracing::debug!(query = %query, candidates = candidates.len(), "Catalog search complete");

        Ok(candidates)
    }

    async fn fetch_full_candidate(
        &self,
        release_mbid: &str,
    ) -> Result<SourceRecord, CatalogError> {
        let release: MbRelease = self
            .get_json(self.lookup_request(release_mbid), || {
                CatalogError::ReleaseNotFound(release_mbid.to_string())
            })
            .await?;

        Ok(source_record_from_release(release, COVER_ART_BASE_URL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_entry_transformation() {
        let json = r#"{
            "releases": [{
                "id": "9162580e-5df4-32de-80cc-f45a8d8a9b1d",
                "title": "Abbey Road",
                "score": 100,
                "date": "1969-09-26",
                "country": "GB",
                "track-count": 17,
                "artist-credit": [{"name": "The Beatles", "artist": {"id": "b10bbbfc"}}]
            }]
        }"#;

        let response: MbReleaseSearchResponse = serde_json::from_str(json).unwrap();
        let candidate = candidate_from_search(response.releases.into_iter().next().unwrap());

        assert_eq!(candidate.title, "Abbey Road");
        assert_eq!(candidate.artist_name, "The Beatles");
        assert_eq!(candidate.source_score, Some(100));
        assert_eq!(candidate.track_count, Some(17));
    }

    #[test]
    fn test_release_transformation() {
        let json = r#"{
            "id": "rel-1",
            "title": "Abbey Road",
            "date": "1969-09-26",
            "country": "GB",
            "barcode": "5099969944123",
            "artist-credit": [
                {"name": "The Beatles", "joinphrase": "", "artist": {"id": "artist-1", "name": "The Beatles"}}
            ],
            "label-info": [{"label": {"name": "Apple Records"}}],
            "genres": [{"name": "rock"}],
            "media": [{
                "position": 1,
                "tracks": [
                    {"position": 1, "title": "Come Together", "length": 259000,
                     "recording": {"id": "rec-1", "length": 259733}},
                    {"position": 2, "title": "Something", "length": null,
                     "recording": {"id": "rec-2", "length": 182000}}
                ]
            }],
            "cover-art-archive": {"front": true}
        }"#;

        let release: MbRelease = serde_json::from_str(json).unwrap();
        let source = source_record_from_release(release, "https://caa.example");

        assert_eq!(source.release_mbid, "rel-1");
        assert_eq!(source.artist_mbid.as_deref(), Some("artist-1"));
        assert_eq!(source.labels, vec!["Apple Records".to_string()]);
        assert_eq!(source.genres, vec!["rock".to_string()]);
        assert_eq!(source.tracks.len(), 2);
        assert_eq!(source.tracks[0].duration_ms, Some(259_000));
        // Track length falls back to the recording length
        assert_eq!(source.tracks[1].duration_ms, Some(182_000));
        assert_eq!(
            source.cover_art_url.as_deref(),
            Some("https://caa.example/release/rel-1/front")
        );
    }

    #[test]
    fn test_empty_joinphrase_dropped() {
        let credits = vec![MbArtistCredit {
            name: "Queen".to_string(),
            joinphrase: Some(String::new()),
            artist: None,
        }];
        let domain = credits_from_dto(&credits);
        assert_eq!(domain[0].join_phrase, None);
    }

    #[test]
    fn test_search_request_encodes_query() {
        let catalog = MusicBrainzCatalog::new(&CatalogConfig::default()).unwrap();

        let request = catalog.search_request("AC/DC").build().unwrap();
        assert_eq!(
            request.url().query(),
            Some("query=AC%2FDC&fmt=json&limit=25")
        );

        let spaced = catalog.search_request("Abbey Road").build().unwrap();
        assert_eq!(
            spaced.url().query(),
            Some("query=Abbey+Road&fmt=json&limit=25")
        );
    }

    #[test]
    fn test_lookup_request_inc_list() {
        let catalog = MusicBrainzCatalog::new(&CatalogConfig::default()).unwrap();
        let request = catalog.lookup_request("rel-1").build().unwrap();

        assert!(request.url().path().ends_with("/release/rel-1"));
        assert_eq!(
            request.url().query(),
            Some("inc=recordings+artist-credits+labels+genres&fmt=json")
        );
    }
}
