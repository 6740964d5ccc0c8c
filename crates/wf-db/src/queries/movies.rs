//! Movie CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use wf_core::{Error, MovieId, Result};

use crate::models::{now_rfc3339, BlobRef, Movie};
use crate::queries::{ListOrder, MetadataUpdate};

const COLS: &str =
    "id, title, description, hidden, file_name, file_extension, upload_date, last_modified";

/// Insert a fully populated movie row.
pub fn insert_movie(conn: &Connection, movie: &Movie) -> Result<()> {
    conn.execute(
        "INSERT INTO movies (id, title, description, hidden, file_name, file_extension,
                             upload_date, last_modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            movie.id.to_string(),
            movie.title,
            movie.description,
            movie.hidden,
            movie.file_name,
            movie.file_extension,
            movie.upload_date,
            movie.last_modified,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get a movie by ID.
pub fn get_movie(conn: &Connection, id: MovieId) -> Result<Option<Movie>> {
    let q = format!("SELECT {COLS} FROM movies WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], Movie::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List up to `limit` movies.
pub fn list_movies(conn: &Connection, order: ListOrder, limit: i64) -> Result<Vec<Movie>> {
    let q = format!(
        "SELECT {COLS} FROM movies {} LIMIT ?1",
        order.order_clause()
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([limit], Movie::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Apply a partial metadata update.
pub fn update_movie(
    conn: &Connection,
    id: MovieId,
    update: &MetadataUpdate,
) -> Result<Option<Movie>> {
    let n = conn
        .execute(
            "UPDATE movies SET
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
    get_movie(conn, id)
}

/// Delete a movie row. Returns `false` if it did not exist.
pub fn delete_movie(conn: &Connection, id: MovieId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM movies WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Every movie blob reference.
pub fn list_blob_refs(conn: &Connection) -> Result<Vec<BlobRef>> {
    let mut stmt = conn
        .prepare("SELECT id, file_name FROM movies")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BlobRef {
                table: "movies",
                id: row.get(0)?,
                file_name: row.get(1)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn sample(title: &str) -> Movie {
        let id = MovieId::new();
        let now = now_rfc3339();
        Movie {
            id,
            title: title.into(),
            description: "desc".into(),
            hidden: false,
            file_name: format!("{id}.mkv"),
            file_extension: "mkv".into(),
            upload_date: now.clone(),
            last_modified: now,
        }
    }

    #[test]
    fn insert_get_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let movie = sample("Heat");
        insert_movie(&conn, &movie).unwrap();

        let fetched = get_movie(&conn, movie.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Heat");
        assert_eq!(fetched.file_name, movie.file_name);

        assert!(delete_movie(&conn, movie.id).unwrap());
        assert!(!delete_movie(&conn, movie.id).unwrap());
    }

    #[test]
    fn update_and_list() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let movie = sample("Ronin");
        insert_movie(&conn, &movie).unwrap();
        insert_movie(&conn, &sample("Thief")).unwrap();

        let update = MetadataUpdate {
            description: Some("Paris car chases".into()),
            ..Default::default()
        };
        let updated = update_movie(&conn, movie.id, &update).unwrap().unwrap();
        assert_eq!(updated.title, "Ronin");
        assert_eq!(updated.description, "Paris car chases");

        assert_eq!(list_movies(&conn, ListOrder::UploadDate, 15).unwrap().len(), 2);
        assert_eq!(list_blob_refs(&conn).unwrap().len(), 2);
    }
}
