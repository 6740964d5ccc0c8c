//! Storage audit: compares blob references in the store with the files in
//! each collection directory.
//!
//! Reports rows whose blob is missing (dangling rows) and files that no row
//! references (orphaned blobs). It never modifies anything.

use std::collections::HashSet;
use std::io;

use serde::Serialize;
use wf_core::{BlobCollection, Error, Result};
use wf_db::models::BlobRef;
use wf_db::EntityStore;

use crate::storage::StorageLayout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingRow {
    pub collection: BlobCollection,
    #[serde(flatten)]
    pub row: BlobRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedBlob {
    pub collection: BlobCollection,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub dangling_rows: Vec<DanglingRow>,
    pub orphaned_blobs: Vec<OrphanedBlob>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_rows.is_empty() && self.orphaned_blobs.is_empty()
    }
}

/// Audit every blob collection.
pub async fn audit(store: &dyn EntityStore, layout: &StorageLayout) -> Result<AuditReport> {
    let mut report = AuditReport::default();

    for collection in BlobCollection::ALL {
        let refs = store.blob_refs(collection)?;
        let files = list_files(layout, collection).await?;

        let referenced: HashSet<&str> = refs.iter().map(|r| r.file_name.as_str()).collect();

        for row in &refs {
            if !files.contains(&row.file_name) {
                report.dangling_rows.push(DanglingRow {
                    collection,
                    row: row.clone(),
                });
            }
        }

        let mut orphans: Vec<&String> = files
            .iter()
            .filter(|f| !referenced.contains(f.as_str()))
            .collect();
        orphans.sort();
        report
            .orphaned_blobs
            .extend(orphans.into_iter().map(|file_name| OrphanedBlob {
                collection,
                file_name: file_name.clone(),
            }));
    }

    if !report.is_clean() {
        tracing::warn!(
            dangling = report.dangling_rows.len(),
            orphaned = report.orphaned_blobs.len(),
            "Storage audit found inconsistencies"
        );
    }
    Ok(report)
}

/// Names of the regular files in a collection directory. A missing
/// directory has no files.
async fn list_files(layout: &StorageLayout, collection: BlobCollection) -> Result<HashSet<String>> {
    let dir = layout.collection_dir(collection);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(Error::storage(&dir, e)),
    };

    let mut files = HashSet::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::storage(&dir, e))? {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file {
            files.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}
