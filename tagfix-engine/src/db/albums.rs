//! Album database operations
//!
//! The album row's `updated_at` column is the optimistic-lock token. It is
//! only ever written through [`advance_token`], whose guarded UPDATE is the
//! first statement of every apply transaction.

use crate::models::{AlbumRecord, ArtistCredit, TrackRecord};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tagfix_common::{Error, Result};
use uuid::Uuid;

/// Load an album with its tracklist and current token
pub async fn load_album_with_tracks(
    pool: &SqlitePool,
    album_guid: Uuid,
) -> Result<Option<AlbumRecord>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, artist_credits, release_date, country, barcode,
               labels, genres, release_mbid, artist_mbid, cover_art_url, updated_at
        FROM albums
        WHERE guid = ?
        "#,
    )
    .bind(album_guid.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let artist_credits: Vec<ArtistCredit> = parse_json_column(row.get("artist_credits"))?;
    let labels: Vec<String> = parse_json_column(row.get("labels"))?;
    let genres: Vec<String> = parse_json_column(row.get("genres"))?;

    let track_rows = sqlx::query(
        r#"
        SELECT guid, disc_number, position, title, duration_ms, recording_mbid
        FROM tracks
        WHERE album_guid = ? AND disc_number IS NOT NULL AND position IS NOT NULL
        ORDER BY disc_number, position
        "#,
    )
    .bind(album_guid.to_string())
    .fetch_all(pool)
    .await?;

    let mut tracks = Vec::with_capacity(track_rows.len());
    for track_row in track_rows {
        let guid_str: String = track_row.get("guid");
        tracks.push(TrackRecord {
            guid: parse_guid(&guid_str)?,
            disc_number: track_row.get::<i64, _>("disc_number") as u32,
            position: track_row.get::<i64, _>("position") as u32,
            title: track_row.get("title"),
            duration_ms: track_row
                .get::<Option<i64>, _>("duration_ms")
                .map(|ms| ms as u32),
            recording_mbid: track_row.get("recording_mbid"),
        });
    }

    let guid_str: String = row.get("guid");
    Ok(Some(AlbumRecord {
        guid: parse_guid(&guid_str)?,
        title: row.get("title"),
        artist_credits,
        release_date: row.get("release_date"),
        country: row.get("country"),
        barcode: row.get("barcode"),
        labels,
        genres,
        release_mbid: row.get("release_mbid"),
        artist_mbid: row.get("artist_mbid"),
        cover_art_url: row.get("cover_art_url"),
        tracks,
        updated_at: row.get("updated_at"),
    }))
}

/// Insert an album snapshot (setup/import path)
pub async fn insert_album(pool: &SqlitePool, album: &AlbumRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO albums (guid, title, artist_credits, release_date, country, barcode,
                            labels, genres, release_mbid, artist_mbid, cover_art_url, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(album.guid.to_string())
    .bind(&album.title)
    .bind(to_json(&album.artist_credits)?)
    .bind(&album.release_date)
    .bind(&album.country)
    .bind(&album.barcode)
    .bind(to_json(&album.labels)?)
    .bind(to_json(&album.genres)?)
    .bind(&album.release_mbid)
    .bind(&album.artist_mbid)
    .bind(&album.cover_art_url)
    .bind(&album.updated_at)
    .execute(pool)
    .await?;

    for track in &album.tracks {
        sqlx::query(
            r#"
            INSERT INTO tracks (guid, album_guid, disc_number, position, title,
                                duration_ms, recording_mbid)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(track.guid.to_string())
        .bind(album.guid.to_string())
        .bind(i64::from(track.disc_number))
        .bind(i64::from(track.position))
        .bind(&track.title)
        .bind(track.duration_ms.map(i64::from))
        .bind(&track.recording_mbid)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Token-guarded token advance; returns false when the stored token no
/// longer matches `expected` (a concurrent writer got there first)
pub async fn advance_token(
    conn: &mut SqliteConnection,
    album_guid: Uuid,
    expected: &str,
    new_token: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE albums SET updated_at = ? WHERE guid = ? AND updated_at = ?")
        .bind(new_token)
        .bind(album_guid.to_string())
        .bind(expected)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Read the current token (for reporting a lock conflict)
pub async fn read_token(conn: &mut SqliteConnection, album_guid: Uuid) -> Result<Option<String>> {
    let row = sqlx::query("SELECT updated_at FROM albums WHERE guid = ?")
        .bind(album_guid.to_string())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| r.get("updated_at")))
}

/// Write one scalar/JSON album column
///
/// `column` comes from `AlbumField::as_str` or the cover-art literal, never
/// from caller input.
pub async fn set_album_column(
    conn: &mut SqliteConnection,
    album_guid: Uuid,
    column: &'static str,
    value: Option<&str>,
) -> Result<()> {
    let sql = format!("UPDATE albums SET {} = ? WHERE guid = ?", column);
    sqlx::query(&sql)
        .bind(value)
        .bind(album_guid.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

/// Update a matched track in place
pub async fn update_track(
    conn: &mut SqliteConnection,
    track_guid: Uuid,
    title: &str,
    duration_ms: Option<u32>,
    recording_mbid: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE tracks SET title = ?, duration_ms = ?, recording_mbid = ? WHERE guid = ?",
    )
    .bind(title)
    .bind(duration_ms.map(i64::from))
    .bind(recording_mbid)
    .bind(track_guid.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

/// Insert a track the source added
pub async fn insert_track(
    conn: &mut SqliteConnection,
    album_guid: Uuid,
    disc_number: u32,
    position: u32,
    title: &str,
    duration_ms: Option<u32>,
    recording_mbid: Option<&str>,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO tracks (guid, album_guid, disc_number, position, title,
                            duration_ms, recording_mbid)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(album_guid.to_string())
    .bind(i64::from(disc_number))
    .bind(i64::from(position))
    .bind(title)
    .bind(duration_ms.map(i64::from))
    .bind(recording_mbid)
    .execute(conn)
    .await?;

    Ok(guid)
}

/// Delete a track the source removed
pub async fn delete_track(conn: &mut SqliteConnection, track_guid: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM tracks WHERE guid = ?")
        .bind(track_guid.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

/// Detach a removed track from the tracklist, keeping the row
pub async fn orphan_track(conn: &mut SqliteConnection, track_guid: Uuid) -> Result<()> {
    sqlx::query("UPDATE tracks SET disc_number = NULL, position = NULL WHERE guid = ?")
        .bind(track_guid.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

/// Update derived status flags after a successful apply
pub async fn set_sync_status(
    conn: &mut SqliteConnection,
    album_guid: Uuid,
    source_mbid: &str,
) -> Result<()> {
    sqlx::query("UPDATE albums SET needs_review = 0, last_synced_mbid = ? WHERE guid = ?")
        .bind(source_mbid)
        .bind(album_guid.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Malformed guid '{}': {}", value, e)))
}

fn parse_json_column<T: serde::de::DeserializeOwned>(value: String) -> Result<T> {
    serde_json::from_str(&value)
        .map_err(|e| Error::Internal(format!("Malformed JSON column: {}", e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Internal(format!("JSON encode: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        tagfix_common::db::init::create_schema(&pool).await.unwrap();
        pool
    }

    fn sample_album() -> AlbumRecord {
        AlbumRecord {
            guid: Uuid::new_v4(),
            title: "Abbey Road".to_string(),
            artist_credits: vec![ArtistCredit::new("The Beatles")],
            release_date: Some("1969-09-26".to_string()),
            country: Some("GB".to_string()),
            barcode: None,
            labels: vec!["Apple Records".to_string()],
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

    #[tokio::test]
    async fn test_insert_and_load_roundtrip() {
        let pool = test_pool().await;
        let album = sample_album();

        insert_album(&pool, &album).await.unwrap();
        let loaded = load_album_with_tracks(&pool, album.guid)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.title, "Abbey Road");
        assert_eq!(loaded.artist_credits, album.artist_credits);
        assert_eq!(loaded.labels, album.labels);
        assert_eq!(loaded.tracks.len(), 1);
        assert_eq!(loaded.tracks[0].title, "Come Together");
        assert_eq!(loaded.updated_at, album.updated_at);
    }

    #[tokio::test]
    async fn test_load_missing_album() {
        let pool = test_pool().await;
        let loaded = load_album_with_tracks(&pool, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_advance_token_guard() {
        let pool = test_pool().await;
        let album = sample_album();
        insert_album(&pool, &album).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();

        // Matching token advances
        let ok = advance_token(&mut conn, album.guid, &album.updated_at, "t1")
            .await
            .unwrap();
        assert!(ok);

        // Stale token does not
        let stale = advance_token(&mut conn, album.guid, &album.updated_at, "t2")
            .await
            .unwrap();
        assert!(!stale);
        assert_eq!(
            read_token(&mut conn, album.guid).await.unwrap().as_deref(),
            Some("t1")
        );
    }

    #[tokio::test]
    async fn test_orphaned_track_leaves_tracklist() {
        let pool = test_pool().await;
        let album = sample_album();
        insert_album(&pool, &album).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        orphan_track(&mut conn, album.tracks[0].guid).await.unwrap();
        drop(conn);

        let loaded = load_album_with_tracks(&pool, album.guid)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.tracks.is_empty());

        // The row itself survives
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
