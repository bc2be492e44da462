//! Audit log operations
//!
//! One row per successful apply. The insert always runs on the apply
//! transaction's connection so the audit trail commits or rolls back with
//! the changes it describes.

use crate::models::{AuditEntry, AuditRecord};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tagfix_common::{Error, Result};
use uuid::Uuid;

/// Insert an audit record (same transaction as the changes)
pub async fn insert_audit_record(conn: &mut SqliteConnection, record: &AuditRecord) -> Result<()> {
    let entries = serde_json::to_string(&record.entries)
        .map_err(|e| Error::Internal(format!("JSON encode: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO audit_log (guid, album_guid, source_mbid, applied_at, entries)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.guid.to_string())
    .bind(record.album_guid.to_string())
    .bind(&record.source_mbid)
    .bind(&record.applied_at)
    .bind(entries)
    .execute(conn)
    .await?;

    Ok(())
}

/// List audit records for an album, newest first
pub async fn list_audit_records(pool: &SqlitePool, album_guid: Uuid) -> Result<Vec<AuditRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, album_guid, source_mbid, applied_at, entries
        FROM audit_log
        WHERE album_guid = ?
        ORDER BY applied_at DESC
        "#,
    )
    .bind(album_guid.to_string())
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let guid_str: String = row.get("guid");
        let album_guid_str: String = row.get("album_guid");
        let entries_json: String = row.get("entries");

        let entries: Vec<AuditEntry> = serde_json::from_str(&entries_json)
            .map_err(|e| Error::Internal(format!("Malformed audit entries: {}", e)))?;

        records.push(AuditRecord {
            guid: Uuid::parse_str(&guid_str)
                .map_err(|e| Error::Internal(format!("Malformed guid: {}", e)))?,
            album_guid: Uuid::parse_str(&album_guid_str)
                .map_err(|e| Error::Internal(format!("Malformed guid: {}", e)))?,
            source_mbid: row.get("source_mbid"),
            applied_at: row.get("applied_at"),
            entries,
        });
    }

    Ok(records)
}
