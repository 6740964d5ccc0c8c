//! Filesystem layout of the application directory.
//!
//! ```text
//! {app_dir}/db/
//! {app_dir}/storage/videos/{id}.{ext}
//! {app_dir}/storage/covers/{id}.{ext}
//! {app_dir}/storage/staging/
//! ```

use std::path::{Path, PathBuf};

use wf_core::{BlobCollection, Error, Result};

/// Permission bits for every directory the server creates.
#[cfg(unix)]
const DIR_MODE: u32 = 0o770;

/// Resolves blob and staging paths under one application directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    app_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn db_dir(&self) -> PathBuf {
        self.app_dir.join("db")
    }

    pub fn collection_dir(&self, collection: BlobCollection) -> PathBuf {
        self.app_dir.join(collection.relative_dir())
    }

    /// Where multipart file fields are spooled before validation.
    pub fn staging_dir(&self) -> PathBuf {
        self.app_dir.join("storage").join("staging")
    }

    pub fn blob_path(&self, collection: BlobCollection, file_name: &str) -> PathBuf {
        self.collection_dir(collection).join(file_name)
    }

    /// Create every directory of the layout.
    pub async fn ensure(&self) -> Result<()> {
        ensure_dir(&self.db_dir()).await?;
        for collection in BlobCollection::ALL {
            ensure_dir(&self.collection_dir(collection)).await?;
        }
        ensure_dir(&self.staging_dir()).await
    }
}

/// Recursively create `path` with mode 0770 on unix.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);

    builder
        .create(path)
        .await
        .map_err(|source| Error::StorageUnavailable {
            path: path.display().to_string(),
            source,
        })
}
