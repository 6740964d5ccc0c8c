//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.
//!
//! Parent links (`episodes.parent_id`, `covers.parent_id`) are plain
//! columns. The upload and delete paths keep them consistent with the blob
//! collections, so SQLite does not enforce them.

use rusqlite::Connection;
use wf_core::{Error, Result};

/// V1: initial schema.
const V1_INITIAL: &str = r#"
CREATE TABLE shows (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    episode_count INTEGER NOT NULL DEFAULT 0,
    hidden        INTEGER NOT NULL DEFAULT 0,
    upload_date   TEXT NOT NULL,
    last_modified TEXT NOT NULL
);

CREATE TABLE episodes (
    id             TEXT PRIMARY KEY,
    parent_id      TEXT NOT NULL,
    episode_number INTEGER NOT NULL DEFAULT 0,
    title          TEXT NOT NULL DEFAULT '',
    description    TEXT NOT NULL DEFAULT '',
    file_name      TEXT NOT NULL UNIQUE,
    file_extension TEXT NOT NULL,
    upload_date    TEXT NOT NULL,
    last_modified  TEXT NOT NULL
);

CREATE TABLE movies (
    id             TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    hidden         INTEGER NOT NULL DEFAULT 0,
    file_name      TEXT NOT NULL UNIQUE,
    file_extension TEXT NOT NULL,
    upload_date    TEXT NOT NULL,
    last_modified  TEXT NOT NULL
);

CREATE TABLE covers (
    id             TEXT PRIMARY KEY,
    parent_id      TEXT NOT NULL UNIQUE,
    parent_kind    TEXT NOT NULL,
    owner_user_id  TEXT,
    file_extension TEXT NOT NULL,
    file_name      TEXT NOT NULL UNIQUE,
    upload_date    TEXT NOT NULL
);

CREATE INDEX idx_episodes_parent ON episodes(parent_id, episode_number);
CREATE INDEX idx_shows_upload_date ON shows(upload_date);
CREATE INDEX idx_movies_upload_date ON movies(upload_date);
"#;

/// All migrations in order. Each entry is `(version, sql)`.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}
