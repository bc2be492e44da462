//! Database initialization
//!
//! Creates the database on first run and brings up the schema. All table
//! creation functions are idempotent (`CREATE TABLE IF NOT EXISTS`) and safe
//! to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Apply connection pragmas: foreign keys, WAL, busy timeout
///
/// WAL allows concurrent readers with one writer, which matters when several
/// operators preview records while an apply transaction is committing.
pub async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_albums_table(pool).await?;
    create_tracks_table(pool).await?;
    create_audit_log_table(pool).await?;
    Ok(())
}

/// Albums table
///
/// `updated_at` doubles as the optimistic-lock token: it is written by the
/// apply service (RFC 3339 with nanoseconds) and compared against the token
/// captured at preview time.
pub async fn create_albums_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS albums (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist_credits TEXT NOT NULL DEFAULT '[]',
            release_date TEXT,
            country TEXT,
            barcode TEXT,
            labels TEXT NOT NULL DEFAULT '[]',
            genres TEXT NOT NULL DEFAULT '[]',
            release_mbid TEXT,
            artist_mbid TEXT,
            cover_art_url TEXT,
            needs_review INTEGER NOT NULL DEFAULT 0,
            last_synced_mbid TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Tracks table
///
/// `disc_number`/`position` are nullable so the "orphan" removed-track policy
/// can detach a track from the tracklist without deleting the row.
pub async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            guid TEXT PRIMARY KEY,
            album_guid TEXT NOT NULL REFERENCES albums(guid) ON DELETE CASCADE,
            disc_number INTEGER,
            position INTEGER,
            title TEXT NOT NULL,
            duration_ms INTEGER,
            recording_mbid TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_guid, disc_number, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit log table
///
/// One row per successful apply; `entries` is a JSON array of
/// {field, before, after} objects.
pub async fn create_audit_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            guid TEXT PRIMARY KEY,
            album_guid TEXT NOT NULL REFERENCES albums(guid),
            source_mbid TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            entries TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_album ON audit_log(album_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

        create_schema(&pool).await.unwrap();
        // Second run must not fail
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tagfix.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Schema is queryable
        sqlx::query("SELECT COUNT(*) FROM albums")
            .fetch_one(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_track_cascade_on_album_delete() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        configure_pragmas(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO albums (guid, title, updated_at) VALUES ('a1', 'Test', 't0')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO tracks (guid, album_guid, disc_number, position, title) \
             VALUES ('t1', 'a1', 1, 1, 'Track')",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM albums WHERE guid = 'a1'")
            .execute(&pool)
            .await
            .unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}
