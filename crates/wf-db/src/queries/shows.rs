//! Show CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use wf_core::{Error, Result, ShowId};

use crate::models::{now_rfc3339, Show};
use crate::queries::{ListOrder, MetadataUpdate};

const COLS: &str = "id, title, description, episode_count, hidden, upload_date, last_modified";

/// Insert a show root row under a caller-chosen id.
pub fn create_show(
    conn: &Connection,
    id: ShowId,
    title: &str,
    description: &str,
    hidden: bool,
) -> Result<Show> {
    let now = now_rfc3339();

    conn.execute(
        "INSERT INTO shows (id, title, description, episode_count, hidden, upload_date, last_modified)
         VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5)",
        rusqlite::params![id.to_string(), title, description, hidden, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Show {
        id,
        title: title.to_string(),
        description: description.to_string(),
        episode_count: 0,
        hidden,
        upload_date: now.clone(),
        last_modified: now,
    })
}

/// Get a show by ID.
pub fn get_show(conn: &Connection, id: ShowId) -> Result<Option<Show>> {
    let q = format!("SELECT {COLS} FROM shows WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], Show::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List up to `limit` shows.
pub fn list_shows(conn: &Connection, order: ListOrder, limit: i64) -> Result<Vec<Show>> {
    let q = format!(
        "SELECT {COLS} FROM shows {} LIMIT ?1",
        order.order_clause()
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([limit], Show::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Apply a partial metadata update. Returns the updated show, or `None` if
/// no show has this id.
pub fn update_show(conn: &Connection, id: ShowId, update: &MetadataUpdate) -> Result<Option<Show>> {
    let n = conn
        .execute(
            "UPDATE shows SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                hidden = COALESCE(?4, hidden),
                last_modified = ?5
             WHERE id = ?1",
            rusqlite::params![
                id.to_string(),
                update.title,
                update.description,
                update.hidden,
                now_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if n == 0 {
        return Ok(None);
    }
    get_show(conn, id)
}

/// Recompute `episode_count` from the episode rows of this show.
pub fn refresh_episode_count(conn: &Connection, id: ShowId) -> Result<()> {
    conn.execute(
        "UPDATE shows SET
            episode_count = (SELECT COUNT(*) FROM episodes WHERE parent_id = ?1),
            last_modified = ?2
         WHERE id = ?1",
        rusqlite::params![id.to_string(), now_rfc3339()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete a show row. Returns `false` if it did not exist.
pub fn delete_show(conn: &Connection, id: ShowId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM shows WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
