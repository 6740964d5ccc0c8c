//! Cascading deletes of composite entities.
//!
//! A show is removed in the order episode blobs, episode rows, cover blob,
//! cover row, show row; a movie in the order movie blob, cover, movie row.
//! Each stage runs only if the previous one succeeded. A failing stage stops
//! the delete and is reported as [`Error::Cascade`] with the stage and id,
//! leaving the earlier stages applied. Nothing is retried.
//!
//! A blob that is already missing is logged as a filesystem/database
//! desync and recorded in the [`DeleteReport`]; it does not fail the
//! delete.

use std::io;
use std::sync::Arc;

use serde::Serialize;
use wf_core::{
    BlobCollection, CoverParent, DeleteStage, EpisodeId, Error, MovieId, Result, ShowId,
};
use wf_db::EntityStore;

use crate::storage::StorageLayout;

/// What a delete removed and which blobs were already gone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteReport {
    pub id: String,
    pub removed_rows: usize,
    pub removed_blobs: Vec<String>,
    pub missing_blobs: Vec<String>,
}

impl DeleteReport {
    fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

/// Deletes shows, movies, episodes and covers together with their blobs.
#[derive(Clone)]
pub struct CascadingDelete {
    store: Arc<dyn EntityStore>,
    layout: StorageLayout,
}

impl CascadingDelete {
    pub fn new(store: Arc<dyn EntityStore>, layout: StorageLayout) -> Self {
        Self { store, layout }
    }

    /// Delete a show, its episodes and its cover.
    pub async fn delete_show(&self, raw_id: &str) -> Result<DeleteReport> {
        let id = ShowId::parse(raw_id)
            .map_err(|e| Error::cascade(DeleteStage::Validate, raw_id, e))?;
        let stage_err = |stage| move |e| Error::cascade(stage, id, e);
        let mut report = DeleteReport::new(id);

        let episodes = self
            .store
            .episodes_by_show(id)
            .map_err(stage_err(DeleteStage::EnumerateDependents))?;
        tracing::debug!(show_id = %id, episodes = episodes.len(), "Deleting show");

        for episode in &episodes {
            self.remove_blob(BlobCollection::Videos, &episode.file_name, &mut report)
                .await
                .map_err(stage_err(DeleteStage::RemoveDependentBlobs))?;
        }

        report.removed_rows += self
            .store
            .delete_episodes_by_show(id)
            .map_err(stage_err(DeleteStage::RemoveDependentRows))?;

        self.remove_cover(CoverParent::Show(id), &mut report)
            .await
            .map_err(stage_err(DeleteStage::RemoveCover))?;

        self.remove_root(
            self.store.delete_show(id),
            "show",
            id,
            &mut report,
        )?;

        tracing::info!(
            show_id = %id,
            rows = report.removed_rows,
            blobs = report.removed_blobs.len(),
            missing = report.missing_blobs.len(),
            "Deleted show"
        );
        Ok(report)
    }

    /// Delete a movie, its media blob and its cover.
    pub async fn delete_movie(&self, raw_id: &str) -> Result<DeleteReport> {
        let id = MovieId::parse(raw_id)
            .map_err(|e| Error::cascade(DeleteStage::Validate, raw_id, e))?;
        let stage_err = |stage| move |e| Error::cascade(stage, id, e);
        let mut report = DeleteReport::new(id);

        let movie = self
            .store
            .movie(id)
            .map_err(stage_err(DeleteStage::EnumerateDependents))?;

        if let Some(movie) = &movie {
            self.remove_blob(BlobCollection::Videos, &movie.file_name, &mut report)
                .await
                .map_err(stage_err(DeleteStage::RemoveDependentBlobs))?;
        }

        self.remove_cover(CoverParent::Movie(id), &mut report)
            .await
            .map_err(stage_err(DeleteStage::RemoveCover))?;

        self.remove_root(self.store.delete_movie(id), "movie", id, &mut report)?;

        tracing::info!(movie_id = %id, missing = report.missing_blobs.len(), "Deleted movie");
        Ok(report)
    }

    /// Delete a single episode and refresh its show's episode count.
    pub async fn delete_episode(&self, raw_id: &str) -> Result<DeleteReport> {
        let id = EpisodeId::parse(raw_id)
            .map_err(|e| Error::cascade(DeleteStage::Validate, raw_id, e))?;
        let stage_err = |stage| move |e| Error::cascade(stage, id, e);
        let mut report = DeleteReport::new(id);

        let episode = self
            .store
            .episode(id)
            .map_err(stage_err(DeleteStage::EnumerateDependents))?
            .ok_or_else(|| stage_err(DeleteStage::RemoveRoot)(Error::not_found("episode", id)))?;

        self.remove_blob(BlobCollection::Videos, &episode.file_name, &mut report)
            .await
            .map_err(stage_err(DeleteStage::RemoveDependentBlobs))?;

        self.remove_root(self.store.delete_episode(id), "episode", id, &mut report)?;

        if let Err(e) = self.store.refresh_episode_count(episode.parent_id) {
            tracing::warn!(show_id = %episode.parent_id, error = %e, "Failed to refresh episode count");
        }

        tracing::info!(episode_id = %id, show_id = %episode.parent_id, "Deleted episode");
        Ok(report)
    }

    /// Delete the cover of a show or movie. A parent without a cover is
    /// reported as `NotFound`.
    pub async fn delete_cover(&self, parent: CoverParent) -> Result<DeleteReport> {
        let mut report = DeleteReport::new(parent);
        let removed = self
            .remove_cover(parent, &mut report)
            .await
            .map_err(|e| Error::cascade(DeleteStage::RemoveCover, parent, e))?;

        if !removed {
            return Err(Error::cascade(
                DeleteStage::RemoveCover,
                parent,
                Error::not_found("cover", parent),
            ));
        }
        Ok(report)
    }

    /// Remove the cover blob and row of `parent`. Returns `false` if the
    /// parent has no cover.
    async fn remove_cover(&self, parent: CoverParent, report: &mut DeleteReport) -> Result<bool> {
        let Some(cover) = self.store.cover_by_parent(&parent.to_string())? else {
            return Ok(false);
        };

        self.remove_blob(BlobCollection::Covers, &cover.file_name, report)
            .await?;
        if self.store.delete_cover(cover.id)? {
            report.removed_rows += 1;
        }
        Ok(true)
    }

    fn remove_root(
        &self,
        deleted: Result<bool>,
        entity: &str,
        id: impl std::fmt::Display + Copy,
        report: &mut DeleteReport,
    ) -> Result<()> {
        match deleted {
            Ok(true) => {
                report.removed_rows += 1;
                Ok(())
            }
            Ok(false) => Err(Error::cascade(
                DeleteStage::RemoveRoot,
                id,
                Error::not_found(entity, id),
            )),
            Err(e) => Err(Error::cascade(DeleteStage::RemoveRoot, id, e)),
        }
    }

    async fn remove_blob(
        &self,
        collection: BlobCollection,
        file_name: &str,
        report: &mut DeleteReport,
    ) -> Result<()> {
        let path = self.layout.blob_path(collection, file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                report.removed_blobs.push(file_name.to_string());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "File system and database out-of-sync: blob already missing"
                );
                report.missing_blobs.push(file_name.to_string());
                Ok(())
            }
            Err(e) => Err(Error::storage(&path, e)),
        }
    }
}
