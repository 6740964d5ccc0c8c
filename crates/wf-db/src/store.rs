//! The persistence boundary used by the upload and delete paths.
//!
//! [`EntityStore`] exposes exactly the row operations the record writer and
//! the cascading delete need. Each call is one statement against the store;
//! nothing here spans the filesystem.

use wf_core::{BlobCollection, CoverId, EpisodeId, MovieId, Result, ShowId};

use crate::models::{BlobRef, Cover, Episode, Movie};
use crate::pool::{get_conn, DbPool};
use crate::queries::{covers, episodes, movies, shows};

/// Row-level operations on blob-backed entities.
pub trait EntityStore: Send + Sync {
    fn insert_episode(&self, episode: &Episode) -> Result<()>;
    fn insert_movie(&self, movie: &Movie) -> Result<()>;
    fn insert_cover(&self, cover: &Cover) -> Result<()>;

    fn episode(&self, id: EpisodeId) -> Result<Option<Episode>>;
    fn movie(&self, id: MovieId) -> Result<Option<Movie>>;
    fn episodes_by_show(&self, show: ShowId) -> Result<Vec<Episode>>;
    fn cover_by_parent(&self, parent_id: &str) -> Result<Option<Cover>>;

    /// Returns the number of rows removed.
    fn delete_episodes_by_show(&self, show: ShowId) -> Result<usize>;
    /// The `bool` results report whether a row was removed.
    fn delete_episode(&self, id: EpisodeId) -> Result<bool>;
    fn delete_cover(&self, id: CoverId) -> Result<bool>;
    fn delete_show(&self, id: ShowId) -> Result<bool>;
    fn delete_movie(&self, id: MovieId) -> Result<bool>;

    /// Recompute the cached episode count of a show.
    fn refresh_episode_count(&self, show: ShowId) -> Result<()>;

    /// Every row referencing a blob in `collection`.
    fn blob_refs(&self, collection: BlobCollection) -> Result<Vec<BlobRef>>;
}

/// [`EntityStore`] over the SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EntityStore for SqliteStore {
    fn insert_episode(&self, episode: &Episode) -> Result<()> {
        episodes::insert_episode(&*get_conn(&self.pool)?, episode)
    }

    fn insert_movie(&self, movie: &Movie) -> Result<()> {
        movies::insert_movie(&*get_conn(&self.pool)?, movie)
    }

    fn insert_cover(&self, cover: &Cover) -> Result<()> {
        covers::insert_cover(&*get_conn(&self.pool)?, cover)
    }

    fn episode(&self, id: EpisodeId) -> Result<Option<Episode>> {
        episodes::get_episode(&*get_conn(&self.pool)?, id)
    }

    fn movie(&self, id: MovieId) -> Result<Option<Movie>> {
        movies::get_movie(&*get_conn(&self.pool)?, id)
    }

    fn episodes_by_show(&self, show: ShowId) -> Result<Vec<Episode>> {
        episodes::list_episodes_by_show(&*get_conn(&self.pool)?, show)
    }

    fn cover_by_parent(&self, parent_id: &str) -> Result<Option<Cover>> {
        covers::get_cover_by_parent(&*get_conn(&self.pool)?, parent_id)
    }

    fn delete_episodes_by_show(&self, show: ShowId) -> Result<usize> {
        episodes::delete_episodes_by_show(&*get_conn(&self.pool)?, show)
    }

    fn delete_episode(&self, id: EpisodeId) -> Result<bool> {
        episodes::delete_episode(&*get_conn(&self.pool)?, id)
    }

    fn delete_cover(&self, id: CoverId) -> Result<bool> {
        covers::delete_cover(&*get_conn(&self.pool)?, id)
    }

    fn delete_show(&self, id: ShowId) -> Result<bool> {
        shows::delete_show(&*get_conn(&self.pool)?, id)
    }

    fn delete_movie(&self, id: MovieId) -> Result<bool> {
        movies::delete_movie(&*get_conn(&self.pool)?, id)
    }

    fn refresh_episode_count(&self, show: ShowId) -> Result<()> {
        shows::refresh_episode_count(&*get_conn(&self.pool)?, show)
    }

    fn blob_refs(&self, collection: BlobCollection) -> Result<Vec<BlobRef>> {
        let conn = get_conn(&self.pool)?;
        match collection {
            BlobCollection::Videos => {
                let mut refs = episodes::list_blob_refs(&conn)?;
                refs.extend(movies::list_blob_refs(&conn)?);
                Ok(refs)
            }
            BlobCollection::Covers => covers::list_blob_refs(&conn),
        }
    }
}
