//! Cover CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use wf_core::{CoverId, Error, Result};

use crate::models::{BlobRef, Cover};

const COLS: &str =
    "id, parent_id, parent_kind, owner_user_id, file_extension, file_name, upload_date";

/// Insert a fully populated cover row. Fails if the parent already has one.
pub fn insert_cover(conn: &Connection, cover: &Cover) -> Result<()> {
    conn.execute(
        "INSERT INTO covers (id, parent_id, parent_kind, owner_user_id, file_extension,
                             file_name, upload_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            cover.id.to_string(),
            cover.parent_id,
            cover.parent_kind.as_str(),
            cover.owner_user_id,
            cover.file_extension,
            cover.file_name,
            cover.upload_date,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get the cover attached to a parent (show or movie id).
pub fn get_cover_by_parent(conn: &Connection, parent_id: &str) -> Result<Option<Cover>> {
    let q = format!("SELECT {COLS} FROM covers WHERE parent_id = ?1");
    conn.query_row(&q, [parent_id], Cover::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete a cover row. Returns `false` if it did not exist.
pub fn delete_cover(conn: &Connection, id: CoverId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM covers WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Every cover blob reference.
pub fn list_blob_refs(conn: &Connection) -> Result<Vec<BlobRef>> {
    let mut stmt = conn
        .prepare("SELECT id, file_name FROM covers")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BlobRef {
                table: "covers",
                id: row.get(0)?,
                file_name: row.get(1)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
