//! Unified error type for the watchify backend.
//!
//! Every crate funnels its failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`] and a problem title via [`Error::title`].

use std::fmt;
use std::path::Path;

use crate::media::DeleteStage;

/// Unified error type covering all failure modes in watchify.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed request input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The `Range` header could not be parsed.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "show", "cover").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The requested range starts at or beyond the end of the object.
    #[error("Range start {start} is not satisfiable for an object of {size} bytes")]
    RangeNotSatisfiable {
        /// Requested first byte.
        start: u64,
        /// Total object size.
        size: u64,
    },

    /// A multipart upload exceeded the configured limit.
    #[error("The upload form exceeded {limit} bytes")]
    UploadTooLarge {
        /// Configured limit in bytes.
        limit: u64,
    },

    /// A blob could not be opened or stat'ed for streaming.
    #[error("Media unavailable at {path}: {source}")]
    MediaUnavailable {
        path: String,
        source: std::io::Error,
    },

    /// A blob collection directory could not be created.
    #[error("Storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: String,
        source: std::io::Error,
    },

    /// A filesystem operation on a blob failed for a reason other than
    /// the blob being absent.
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: String,
        source: std::io::Error,
    },

    /// The metadata row was persisted but writing its blob failed. The row
    /// is left dangling until an operator removes it.
    #[error("{entity} {id} was recorded but its file {file_name} could not be written: {source}")]
    PartialUpload {
        entity: String,
        id: String,
        file_name: String,
        source: std::io::Error,
    },

    /// A stage of a cascading delete failed. Earlier stages have already
    /// been applied.
    #[error("Delete of {id} failed at stage {stage}: {source}")]
    Cascade {
        stage: DeleteStage,
        id: String,
        source: Box<Error>,
    },

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) => 400,
            Error::InvalidRange(_) => 400,
            Error::NotFound { .. } => 404,
            Error::RangeNotSatisfiable { .. } => 416,
            Error::UploadTooLarge { .. } => 413,
            Error::MediaUnavailable { .. } => 500,
            Error::StorageUnavailable { .. } => 500,
            Error::Storage { .. } => 500,
            Error::PartialUpload { .. } => 500,
            Error::Cascade { source, .. } => source.http_status(),
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short human-readable summary used as the problem `title`.
    pub fn title(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) | Error::InvalidRange(_) => "Bad request",
            Error::NotFound { .. } => "Data not found",
            Error::RangeNotSatisfiable { .. } => "Range not satisfiable",
            Error::UploadTooLarge { .. } => "Incomplete request",
            Error::MediaUnavailable { .. } => "Media unavailable",
            Error::StorageUnavailable { .. } | Error::Storage { .. } => "Storage error",
            Error::PartialUpload { .. } => "Partial upload",
            Error::Cascade { .. } => "Delete failed",
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => "Unknown Error",
        }
    }

    /// Whether this is the terminal `NotFound` of a delete whose root row
    /// had already been removed. Callers report it as success.
    pub fn is_already_gone(&self) -> bool {
        matches!(
            self,
            Error::Cascade { stage: DeleteStage::RemoveRoot, source, .. }
                if matches!(**source, Error::NotFound { .. })
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(path: &Path, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.display().to_string(),
            source,
        }
    }

    /// Wrap an error as the failure of a delete stage.
    pub fn cascade(stage: DeleteStage, id: impl fmt::Display, source: Error) -> Self {
        Error::Cascade {
            stage,
            id: id.to_string(),
            source: Box::new(source),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
