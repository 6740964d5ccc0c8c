//! Application context shared by every route handler via Axum state.

use std::sync::Arc;

use wf_core::config::Config;
use wf_db::pool::DbPool;
use wf_db::{EntityStore, SqliteStore};

use crate::cascade::CascadingDelete;
use crate::storage::StorageLayout;
use crate::writer::RecordWriter;

/// Cheap to clone; everything inside is shared.
#[derive(Clone)]
pub struct AppContext {
    /// Pool for the read and update queries that bypass the store.
    pub db: DbPool,
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<Config>,
    pub layout: StorageLayout,
    pub writer: RecordWriter,
    pub deleter: CascadingDelete,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config) -> Self {
        let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(db.clone()));
        let layout = StorageLayout::new(config.storage.app_dir.clone());
        Self {
            writer: RecordWriter::new(store.clone(), layout.clone()),
            deleter: CascadingDelete::new(store.clone(), layout.clone()),
            db,
            store,
            config: Arc::new(config),
            layout,
        }
    }
}
