//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` selected with the owning query module's `COLS`.

use serde::Serialize;
use uuid::Uuid;
use wf_core::{CoverId, EpisodeId, MovieId, ParentKind, ShowId};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

fn parse_kind(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<ParentKind> {
    let s: String = row.get(idx)?;
    ParentKind::from_db(&s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown parent kind: {s}").into(),
        )
    })
}

/// Current time as stored in date columns.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Show {
    pub id: ShowId,
    pub title: String,
    pub description: String,
    pub episode_count: i64,
    pub hidden: bool,
    pub upload_date: String,
    pub last_modified: String,
}

impl Show {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            episode_count: row.get(3)?,
            hidden: row.get(4)?,
            upload_date: row.get(5)?,
            last_modified: row.get(6)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub parent_id: ShowId,
    pub episode_number: i64,
    pub title: String,
    pub description: String,
    pub file_name: String,
    pub file_extension: String,
    pub upload_date: String,
    pub last_modified: String,
}

impl Episode {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            parent_id: parse_id(row, 1)?,
            episode_number: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            file_name: row.get(5)?,
            file_extension: row.get(6)?,
            upload_date: row.get(7)?,
            last_modified: row.get(8)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Movie
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub hidden: bool,
    pub file_name: String,
    pub file_extension: String,
    pub upload_date: String,
    pub last_modified: String,
}

impl Movie {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            hidden: row.get(3)?,
            file_name: row.get(4)?,
            file_extension: row.get(5)?,
            upload_date: row.get(6)?,
            last_modified: row.get(7)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Cover
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Cover {
    pub id: CoverId,
    pub parent_id: String,
    pub parent_kind: ParentKind,
    pub owner_user_id: Option<String>,
    pub file_extension: String,
    pub file_name: String,
    pub upload_date: String,
}

impl Cover {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            parent_id: row.get(1)?,
            parent_kind: parse_kind(row, 2)?,
            owner_user_id: row.get(3)?,
            file_extension: row.get(4)?,
            file_name: row.get(5)?,
            upload_date: row.get(6)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Blob references
// ---------------------------------------------------------------------------

/// A row that references a blob, as listed for the storage audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRef {
    /// Table the row lives in.
    pub table: &'static str,
    pub id: String,
    pub file_name: String,
}
