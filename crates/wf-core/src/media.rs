//! Media-domain enums: blob collections, parent kinds, and delete stages.
//!
//! All enums serialize in lowercase/snake_case and implement `Display`
//! manually for consistent string representation in logs and the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ids::{MovieId, ShowId};

// ---------------------------------------------------------------------------
// BlobCollection
// ---------------------------------------------------------------------------

/// A directory of blobs sharing one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobCollection {
    Videos,
    Covers,
}

impl BlobCollection {
    pub const ALL: [BlobCollection; 2] = [BlobCollection::Videos, BlobCollection::Covers];

    /// Directory of this collection relative to the application directory.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new("storage").join(self.to_string())
    }

    /// Content type served for every blob in this collection.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Videos => "video/mp4",
            Self::Covers => "image/jpeg",
        }
    }
}

impl fmt::Display for BlobCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Videos => write!(f, "videos"),
            Self::Covers => write!(f, "covers"),
        }
    }
}

// ---------------------------------------------------------------------------
// ParentKind
// ---------------------------------------------------------------------------

/// The kind of composite entity a cover or stream request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Show,
    Movie,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Movie => "movie",
        }
    }

    /// Parse the value stored in `covers.parent_kind`.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "show" => Some(Self::Show),
            "movie" => Some(Self::Movie),
            _ => None,
        }
    }
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CoverParent
// ---------------------------------------------------------------------------

/// The composite entity a cover belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverParent {
    Show(ShowId),
    Movie(MovieId),
}

impl CoverParent {
    pub fn kind(&self) -> ParentKind {
        match self {
            Self::Show(_) => ParentKind::Show,
            Self::Movie(_) => ParentKind::Movie,
        }
    }
}

impl fmt::Display for CoverParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show(id) => write!(f, "{id}"),
            Self::Movie(id) => write!(f, "{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// DeleteStage
// ---------------------------------------------------------------------------

/// Ordered stages of a cascading delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStage {
    Validate,
    EnumerateDependents,
    RemoveDependentBlobs,
    RemoveDependentRows,
    RemoveCover,
    RemoveRoot,
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::EnumerateDependents => write!(f, "enumerate_dependents"),
            Self::RemoveDependentBlobs => write!(f, "remove_dependent_blobs"),
            Self::RemoveDependentRows => write!(f, "remove_dependent_rows"),
            Self::RemoveCover => write!(f, "remove_cover"),
            Self::RemoveRoot => write!(f, "remove_root"),
        }
    }
}
