//! Episode CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use wf_core::{EpisodeId, Error, Result, ShowId};

use crate::models::{BlobRef, Episode};

const COLS: &str = "id, parent_id, episode_number, title, description, file_name, \
                    file_extension, upload_date, last_modified";

/// Insert a fully populated episode row.
pub fn insert_episode(conn: &Connection, episode: &Episode) -> Result<()> {
    conn.execute(
        "INSERT INTO episodes (id, parent_id, episode_number, title, description, file_name,
                               file_extension, upload_date, last_modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            episode.id.to_string(),
            episode.parent_id.to_string(),
            episode.episode_number,
            episode.title,
            episode.description,
            episode.file_name,
            episode.file_extension,
            episode.upload_date,
            episode.last_modified,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get an episode by ID.
pub fn get_episode(conn: &Connection, id: EpisodeId) -> Result<Option<Episode>> {
    let q = format!("SELECT {COLS} FROM episodes WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], Episode::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List the episodes of a show ordered by episode number.
pub fn list_episodes_by_show(conn: &Connection, show_id: ShowId) -> Result<Vec<Episode>> {
    let q = format!(
        "SELECT {COLS} FROM episodes WHERE parent_id = ?1 ORDER BY episode_number, upload_date"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([show_id.to_string()], Episode::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete one episode row. Returns `false` if it did not exist.
pub fn delete_episode(conn: &Connection, id: EpisodeId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM episodes WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete every episode row of a show. Returns the number removed.
pub fn delete_episodes_by_show(conn: &Connection, show_id: ShowId) -> Result<usize> {
    conn.execute(
        "DELETE FROM episodes WHERE parent_id = ?1",
        [show_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Every episode blob reference.
pub fn list_blob_refs(conn: &Connection) -> Result<Vec<BlobRef>> {
    let mut stmt = conn
        .prepare("SELECT id, file_name FROM episodes")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BlobRef {
                table: "episodes",
                id: row.get(0)?,
                file_name: row.get(1)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
