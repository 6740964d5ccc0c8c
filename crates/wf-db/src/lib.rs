//! wf-db: database access and persistence layer.
//!
//! SQLite-backed storage with connection pooling, embedded migrations,
//! typed models, per-table query modules, and the [`store::EntityStore`]
//! boundary used by the upload and delete paths.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use store::{EntityStore, SqliteStore};
