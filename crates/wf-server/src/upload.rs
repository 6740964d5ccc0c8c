//! Multipart form staging.
//!
//! File fields are spooled into temp files under the staging directory so
//! the whole form can be validated before anything is recorded. A staged
//! file is deleted when its [`Upload`] (or the [`StagedFile`]) is dropped.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use wf_core::{Error, Result};

use crate::storage::ensure_dir;
use crate::writer::{file_extension, Upload};

/// A file field spooled to disk.
#[derive(Debug)]
pub struct StagedFile {
    pub original_name: String,
    pub size: u64,
    file: tokio::fs::File,
    path: tempfile::TempPath,
}

impl StagedFile {
    /// Extension the stored blob will carry. Fails for names the writer
    /// would reject, so a form can be checked before any row is written.
    pub fn extension(&self) -> Result<String> {
        file_extension(&self.original_name)
    }

    pub async fn into_upload(mut self) -> Result<Upload> {
        self.file.rewind().await?;
        Ok(Upload::staged(self.original_name, self.file, self.path))
    }
}

/// Every field of a staged form.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<StagedFile>>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// `true`, `1` and `on` are truthy; anything else (or absence) is false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(str::trim),
            Some("true") | Some("1") | Some("on")
        )
    }

    /// Remove and return the files uploaded under `name`, in form order.
    pub fn take_files(&mut self, name: &str) -> Vec<StagedFile> {
        self.files.remove(name).unwrap_or_default()
    }
}

/// Read the whole form, spooling file fields into `staging_dir`.
pub async fn stage_form(
    multipart: &mut Multipart,
    staging_dir: &Path,
    limit: u64,
) -> Result<UploadForm> {
    ensure_dir(staging_dir).await?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, limit))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        match field.file_name().map(String::from) {
            Some(original_name) => {
                let staged = stage_file(field, original_name, staging_dir, limit).await?;
                tracing::debug!(field = %name, file = %staged.original_name, size = staged.size, "Staged upload");
                form.files.entry(name).or_default().push(staged);
            }
            None => {
                let value = field.text().await.map_err(|e| form_error(e, limit))?;
                form.fields.insert(name, value);
            }
        }
    }
    Ok(form)
}

async fn stage_file(
    mut field: Field<'_>,
    original_name: String,
    staging_dir: &Path,
    limit: u64,
) -> Result<StagedFile> {
    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(staging_dir)
        .map_err(|e| Error::storage(staging_dir, e))?;
    let (file, path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(|e| form_error(e, limit))? {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::storage(&path, e))?;
        size += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| Error::storage(&path, e))?;

    Ok(StagedFile {
        original_name,
        size,
        file,
        path,
    })
}

fn form_error(err: MultipartError, limit: u64) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge { limit }
    } else {
        Error::InvalidRequest(err.body_text())
    }
}
