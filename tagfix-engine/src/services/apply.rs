//! Apply service
//!
//! Writes the operator's selections back to the local store as one atomic
//! transaction. The write set is the intersection of the selections with the
//! diffs that actually changed, so selecting an unchanged field is a no-op
//! and an empty intersection is rejected before any transaction is opened.
//!
//! Concurrency: the first statement of the transaction is a token-guarded
//! UPDATE of the album's `updated_at` column. SQLite's single-writer model
//! makes that check-and-advance atomic; a stale preview loses the race and
//! the store is left untouched.

use crate::db::albums::{
    advance_token, delete_track, insert_track, orphan_track, read_token, set_album_column,
    set_sync_status, update_track,
};
use crate::db::audit::insert_audit_record;
use crate::models::{
    AlbumField, AppliedChanges, ApplyOutcome, AuditEntry, AuditRecord, CoverArtChoice, FieldDiff,
    FieldSelections, ReconciliationResult, TrackChange,
};
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use tagfix_common::config::ApplyConfig;
use tagfix_common::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// What to do with tracks the source no longer lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovedTrackPolicy {
    /// Delete the row
    Delete,
    /// Keep the row but detach it from the tracklist
    Orphan,
}

impl RemovedTrackPolicy {
    pub fn from_name(name: &str) -> tagfix_common::Result<Self> {
        match name {
            "delete" => Ok(RemovedTrackPolicy::Delete),
            "orphan" => Ok(RemovedTrackPolicy::Orphan),
            other => Err(Error::Config(format!(
                "Unknown removed_track_policy '{}' (expected delete or orphan)",
                other
            ))),
        }
    }
}

/// Apply failures
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The selections intersected with the diffs produce no writes
    #[error("No changes selected")]
    NoChangesSelected,

    /// The album changed since the preview was generated
    #[error("Album changed since preview (expected token {expected}, found {actual})")]
    OptimisticLockConflict { expected: String, actual: String },

    #[error("Apply failed: {0}")]
    Failed(#[from] Error),
}

/// One album column write plus its audit rendering
struct FieldWrite {
    field: AlbumField,
    /// Value for the column (JSON for array-shaped fields)
    value: Option<String>,
    before: Option<String>,
    after: Option<String>,
}

struct CoverWrite {
    before: Option<String>,
    after: Option<String>,
}

enum TrackWrite {
    Update {
        guid: Uuid,
        disc_number: u32,
        position: u32,
        before_title: String,
        title: String,
        duration_ms: Option<u32>,
        recording_mbid: Option<String>,
    },
    Insert {
        disc_number: u32,
        position: u32,
        title: String,
        duration_ms: Option<u32>,
        recording_mbid: Option<String>,
    },
    Remove {
        guid: Uuid,
        disc_number: u32,
        position: u32,
        title: String,
    },
}

/// Minimal write set for one apply call
struct UpdatePayload {
    fields: Vec<FieldWrite>,
    cover_art: Option<CoverWrite>,
    tracks: Vec<TrackWrite>,
}

impl UpdatePayload {
    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.cover_art.is_none() && self.tracks.is_empty()
    }
}

/// Applies reconciliation selections to the local store
pub struct ApplyService {
    db: SqlitePool,
    removed_track_policy: RemovedTrackPolicy,
}

impl ApplyService {
    pub fn new(db: SqlitePool, removed_track_policy: RemovedTrackPolicy) -> Self {
        Self {
            db,
            removed_track_policy,
        }
    }

    pub fn from_config(db: SqlitePool, config: &ApplyConfig) -> tagfix_common::Result<Self> {
        Ok(Self::new(
            db,
            RemovedTrackPolicy::from_name(&config.removed_track_policy)?,
        ))
    }

    /// Apply the selected changes from a reconciliation result
    ///
    /// `expected_token` is the `updated_at` value the preview was generated
    /// against. On a token mismatch nothing is written and the caller gets
    /// the actual token back for re-preview.
    pub async fn apply_correction(
        &self,
        result: &ReconciliationResult,
        selections: &FieldSelections,
        expected_token: &str,
    ) -> Result<ApplyOutcome, ApplyError> {
        let payload = build_payload(result, selections)?;
        if payload.is_empty() {
            return Err(ApplyError::NoChangesSelected);
        }

        let album_guid = result.album.guid;
        let new_token = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);

        let mut tx = self.db.begin().await.map_err(Error::from)?;

        if !advance_token(&mut tx, album_guid, expected_token, &new_token).await? {
            let actual = read_token(&mut tx, album_guid).await?.unwrap_or_default();
            warn!(
                album_guid = %album_guid,
                expected = expected_token,
                actual,
                "Apply rejected: stale optimistic-lock token"
            );
            // Dropping the transaction rolls the guard statement back
            return Err(ApplyError::OptimisticLockConflict {
                expected: expected_token.to_string(),
                actual,
            });
        }

        let mut applied = AppliedChanges::default();
        let mut entries = Vec::new();

        for write in &payload.fields {
            set_album_column(&mut tx, album_guid, write.field.as_str(), write.value.as_deref())
                .await?;
            applied.fields.push(write.field);
            entries.push(AuditEntry {
                field: write.field.as_str().to_string(),
                before: write.before.clone(),
                after: write.after.clone(),
            });
        }

        if let Some(cover) = &payload.cover_art {
            set_album_column(&mut tx, album_guid, "cover_art_url", cover.after.as_deref())
                .await?;
            applied.cover_art_changed = true;
            entries.push(AuditEntry {
                field: "cover_art_url".to_string(),
                before: cover.before.clone(),
                after: cover.after.clone(),
            });
        }

        for write in &payload.tracks {
            match write {
                TrackWrite::Update {
                    guid,
                    disc_number,
                    position,
                    before_title,
                    title,
                    duration_ms,
                    recording_mbid,
                } => {
                    update_track(&mut tx, *guid, title, *duration_ms, recording_mbid.as_deref())
                        .await?;
                    applied.tracks_modified += 1;
                    entries.push(AuditEntry {
                        field: format!("track {}-{}", disc_number, position),
                        before: Some(before_title.clone()),
                        after: Some(title.clone()),
                    });
                }
                TrackWrite::Insert {
                    disc_number,
                    position,
                    title,
                    duration_ms,
                    recording_mbid,
                } => {
                    insert_track(
                        &mut tx,
                        album_guid,
                        *disc_number,
                        *position,
                        title,
                        *duration_ms,
                        recording_mbid.as_deref(),
                    )
                    .await?;
                    applied.tracks_added += 1;
                    entries.push(AuditEntry {
                        field: format!("track {}-{}", disc_number, position),
                        before: None,
                        after: Some(title.clone()),
                    });
                }
                TrackWrite::Remove {
                    guid,
                    disc_number,
                    position,
                    title,
                } => {
                    match self.removed_track_policy {
                        RemovedTrackPolicy::Delete => delete_track(&mut tx, *guid).await?,
                        RemovedTrackPolicy::Orphan => orphan_track(&mut tx, *guid).await?,
                    }
                    applied.tracks_removed += 1;
                    entries.push(AuditEntry {
                        field: format!("track {}-{}", disc_number, position),
                        before: Some(title.clone()),
                        after: None,
                    });
                }
            }
        }

        set_sync_status(&mut tx, album_guid, &result.source.release_mbid).await?;

        let audit = AuditRecord {
            guid: Uuid::new_v4(),
            album_guid,
            source_mbid: result.source.release_mbid.clone(),
            applied_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            entries,
        };
        insert_audit_record(&mut tx, &audit).await?;

        tx.commit().await.map_err(Error::from)?;

        info!(
            album_guid = %album_guid,
            source_mbid = %result.source.release_mbid,
            fields = applied.fields.len(),
            tracks_modified = applied.tracks_modified,
            tracks_added = applied.tracks_added,
            tracks_removed = applied.tracks_removed,
            cover_art_changed = applied.cover_art_changed,
            "Applied correction"
        );

        Ok(ApplyOutcome {
            applied,
            audit,
            new_token,
        })
    }
}

/// Intersect the selections with the diffs into a minimal write set
///
/// Iterates the diffs, not the selections, so a selection naming a field the
/// result never compared (or one that did not change) contributes nothing.
fn build_payload(
    result: &ReconciliationResult,
    selections: &FieldSelections,
) -> tagfix_common::Result<UpdatePayload> {
    let mut fields = Vec::new();

    for diff in &result.field_diffs {
        if !diff.classification().is_change() || !selections.fields.contains(&diff.field()) {
            continue;
        }
        fields.push(field_write(diff)?);
    }

    if selections.fields.contains(&AlbumField::ArtistCredits)
        && result.artist_credit.classification.is_change()
    {
        fields.push(FieldWrite {
            field: AlbumField::ArtistCredits,
            value: Some(to_json(&result.source.artist_credits)?),
            before: Some(result.artist_credit.current_display.clone()),
            after: Some(result.artist_credit.source_display.clone()),
        });
    }

    let cover_art = match selections.cover_art {
        CoverArtChoice::KeepCurrent => None,
        CoverArtChoice::UseSource => {
            if result.cover_art.classification.is_change() {
                Some(CoverWrite {
                    before: result.cover_art.current_url.clone(),
                    after: result.cover_art.source_url.clone(),
                })
            } else {
                None
            }
        }
        CoverArtChoice::Clear => result.cover_art.current_url.as_ref().map(|url| CoverWrite {
            before: Some(url.clone()),
            after: None,
        }),
    };

    let mut tracks = Vec::new();
    for diff in &result.track_diffs {
        if diff.change == TrackChange::Match
            || !selections.tracks.includes(diff.disc_number, diff.position)
        {
            continue;
        }

        match diff.change {
            TrackChange::Modified => {
                let guid = diff
                    .current_track_guid
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                let current = diff
                    .current
                    .as_ref()
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                let source = diff
                    .source
                    .as_ref()
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                tracks.push(TrackWrite::Update {
                    guid,
                    disc_number: diff.disc_number,
                    position: diff.position,
                    before_title: current.title.clone(),
                    title: source.title.clone(),
                    duration_ms: source.duration_ms,
                    recording_mbid: source.recording_mbid.clone(),
                });
            }
            TrackChange::Added => {
                let source = diff
                    .source
                    .as_ref()
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                tracks.push(TrackWrite::Insert {
                    disc_number: diff.disc_number,
                    position: diff.position,
                    title: source.title.clone(),
                    duration_ms: source.duration_ms,
                    recording_mbid: source.recording_mbid.clone(),
                });
            }
            TrackChange::Removed => {
                let guid = diff
                    .current_track_guid
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                let current = diff
                    .current
                    .as_ref()
                    .ok_or_else(|| malformed_slot(diff.disc_number, diff.position))?;
                tracks.push(TrackWrite::Remove {
                    guid,
                    disc_number: diff.disc_number,
                    position: diff.position,
                    title: current.title.clone(),
                });
            }
            TrackChange::Match => unreachable!("filtered above"),
        }
    }

    Ok(UpdatePayload {
        fields,
        cover_art,
        tracks,
    })
}

/// Render one changed field diff as a column write
fn field_write(diff: &FieldDiff) -> tagfix_common::Result<FieldWrite> {
    Ok(match diff {
        FieldDiff::Text {
            field,
            current,
            source,
            ..
        }
        | FieldDiff::ExternalId {
            field,
            current,
            source,
            ..
        } => FieldWrite {
            field: *field,
            value: source.clone(),
            before: current.clone(),
            after: source.clone(),
        },
        FieldDiff::Date {
            field,
            current,
            source,
            ..
        } => {
            let before = current.map(|d| d.to_partial_string());
            let after = source.map(|d| d.to_partial_string());
            FieldWrite {
                field: *field,
                value: after.clone(),
                before,
                after,
            }
        }
        FieldDiff::Array {
            field,
            current,
            source,
            ..
        } => FieldWrite {
            field: *field,
            value: Some(to_json(source)?),
            before: Some(current.join(", ")),
            after: Some(source.join(", ")),
        },
    })
}

fn malformed_slot(disc_number: u32, position: u32) -> Error {
    Error::Internal(format!(
        "Track diff slot {}-{} is missing its row identity",
        disc_number, position
    ))
}

fn to_json<T: serde::Serialize>(value: &T) -> tagfix_common::Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Internal(format!("JSON encode: {}", e)))
}
