//! Creation of blob-backed records.
//!
//! Every episode, movie and cover is a metadata row plus one blob named
//! `{id}.{ext}`. The row is written first and the blob second. A failed row
//! insert leaves the filesystem untouched; a failed blob write leaves the
//! row in place and is reported as [`Error::PartialUpload`] so an operator
//! (or the storage audit) can find it.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWriteExt};
use wf_core::{
    BlobCollection, CoverId, CoverParent, EpisodeId, Error, MovieId, Result, ShowId,
};
use wf_db::models::{now_rfc3339, Cover, Episode, Movie};
use wf_db::EntityStore;

use crate::storage::{ensure_dir, StorageLayout};

/// Longest accepted file extension.
const MAX_EXTENSION_LEN: usize = 10;

/// An uploaded file: its client-supplied name and a reader over its bytes.
pub struct Upload {
    pub original_name: String,
    reader: Box<dyn AsyncRead + Send + Unpin>,
    _staged: Option<tempfile::TempPath>,
}

impl Upload {
    pub fn new(original_name: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            original_name: original_name.into(),
            reader: Box::new(reader),
            _staged: None,
        }
    }

    pub fn from_bytes(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(original_name, Cursor::new(bytes.into()))
    }

    /// Upload backed by a staged temp file, removed once the upload drops.
    pub(crate) fn staged(
        original_name: String,
        file: tokio::fs::File,
        path: tempfile::TempPath,
    ) -> Self {
        Self {
            original_name,
            reader: Box::new(file),
            _staged: Some(path),
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("original_name", &self.original_name)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for Upload {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

/// Editable metadata supplied with a movie upload.
#[derive(Debug, Clone, Default)]
pub struct MovieMeta {
    pub title: String,
    pub description: String,
    pub hidden: bool,
}

/// Writes (row, blob) pairs through an [`EntityStore`].
#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<dyn EntityStore>,
    layout: StorageLayout,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn EntityStore>, layout: StorageLayout) -> Self {
        Self { store, layout }
    }

    /// Store an episode of `parent`. The episode number is taken from the
    /// leading digits of the uploaded file name.
    pub async fn write_episode(&self, upload: Upload, parent: ShowId) -> Result<Episode> {
        let id = EpisodeId::new();
        let file_extension = file_extension(&upload.original_name)?;
        let file_name = format!("{id}.{file_extension}");
        let episode_number = episode_number(&upload.original_name);

        self.prepare(BlobCollection::Videos).await?;

        let now = now_rfc3339();
        let episode = Episode {
            id,
            parent_id: parent,
            episode_number,
            title: String::new(),
            description: String::new(),
            file_name,
            file_extension,
            upload_date: now.clone(),
            last_modified: now,
        };
        self.store.insert_episode(&episode)?;

        self.write_blob(BlobCollection::Videos, "episode", &id.to_string(), &episode.file_name, upload)
            .await?;

        tracing::info!(episode_id = %id, show_id = %parent, episode_number, "Stored episode");
        Ok(episode)
    }

    /// Store a movie and its single media blob.
    pub async fn write_movie(&self, upload: Upload, meta: &MovieMeta) -> Result<Movie> {
        let id = MovieId::new();
        let file_extension = file_extension(&upload.original_name)?;
        let file_name = format!("{id}.{file_extension}");

        self.prepare(BlobCollection::Videos).await?;

        let now = now_rfc3339();
        let movie = Movie {
            id,
            title: meta.title.clone(),
            description: meta.description.clone(),
            hidden: meta.hidden,
            file_name,
            file_extension,
            upload_date: now.clone(),
            last_modified: now,
        };
        self.store.insert_movie(&movie)?;

        self.write_blob(BlobCollection::Videos, "movie", &id.to_string(), &movie.file_name, upload)
            .await?;

        tracing::info!(movie_id = %id, "Stored movie");
        Ok(movie)
    }

    /// Store the cover of a show or movie.
    pub async fn write_cover(&self, upload: Upload, parent: CoverParent) -> Result<Cover> {
        let id = CoverId::new();
        let file_extension = file_extension(&upload.original_name)?;
        let file_name = format!("{id}.{file_extension}");

        self.prepare(BlobCollection::Covers).await?;

        let cover = Cover {
            id,
            parent_id: parent.to_string(),
            parent_kind: parent.kind(),
            owner_user_id: None,
            file_extension,
            file_name,
            upload_date: now_rfc3339(),
        };
        self.store.insert_cover(&cover)?;

        self.write_blob(BlobCollection::Covers, "cover", &id.to_string(), &cover.file_name, upload)
            .await?;

        tracing::info!(cover_id = %id, parent = %parent, kind = %parent.kind(), "Stored cover");
        Ok(cover)
    }

    async fn prepare(&self, collection: BlobCollection) -> Result<()> {
        ensure_dir(&self.layout.collection_dir(collection)).await
    }

    async fn write_blob(
        &self,
        collection: BlobCollection,
        entity: &str,
        id: &str,
        file_name: &str,
        mut upload: Upload,
    ) -> Result<()> {
        let path = self.layout.blob_path(collection, file_name);

        if let Err(source) = copy_to_new_file(&mut upload.reader, &path).await {
            tracing::error!(
                entity,
                id,
                path = %path.display(),
                error = %source,
                "Row recorded but blob write failed; row is dangling"
            );
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial blob");
                }
            }
            return Err(Error::PartialUpload {
                entity: entity.to_string(),
                id: id.to_string(),
                file_name: file_name.to_string(),
                source,
            });
        }
        Ok(())
    }
}

async fn copy_to_new_file(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    path: &Path,
) -> std::io::Result<u64> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let written = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Extension of an uploaded file name: the text after the last `.`,
/// lower-cased. Only short alphanumeric extensions are accepted so the
/// stored name cannot escape its collection directory.
pub fn file_extension(original_name: &str) -> Result<String> {
    let invalid = || {
        Error::InvalidRequest(format!(
            "uploaded file '{original_name}' has no usable extension"
        ))
    };

    let (_, ext) = original_name.rsplit_once('.').ok_or_else(invalid)?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(invalid());
    }
    Ok(ext.to_ascii_lowercase())
}

/// Episode number encoded in the leading digits of a file name, e.g.
/// `"03.mp4"` or `"12 - Pilot.mkv"`. Names without leading digits are
/// numbered 0.
pub fn episode_number(original_name: &str) -> i64 {
    let digits: String = original_name
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::warn!(
                file_name = original_name,
                "No episode number in file name; using 0"
            );
            0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use wf_core::ParentKind;
    use wf_db::models::BlobRef;
    use wf_db::pool::init_memory_pool;
    use wf_db::SqliteStore;

    pub(crate) fn setup() -> (tempfile::TempDir, StorageLayout, Arc<dyn EntityStore>) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let store: Arc<dyn EntityStore> =
            Arc::new(SqliteStore::new(init_memory_pool().unwrap()));
        (dir, layout, store)
    }

    #[test]
    fn extension_is_after_last_dot() {
        assert_eq!(file_extension("01.Pilot.MKV").unwrap(), "mkv");
        assert_eq!(file_extension("movie.mp4").unwrap(), "mp4");
    }

    #[test]
    fn unusable_extensions_are_rejected() {
        for name in ["noext", "trailing.", "a.mp4/../../etc", "x.verylongextension", "x.m p4"] {
            assert_matches!(file_extension(name), Err(Error::InvalidRequest(_)), "{name}");
        }
    }

    #[test]
    fn episode_numbers_from_leading_digits() {
        assert_eq!(episode_number("03.mp4"), 3);
        assert_eq!(episode_number("12 - Pilot.mkv"), 12);
        assert_eq!(episode_number("Pilot.mp4"), 0);
        assert_eq!(episode_number(".mp4"), 0);
    }

    #[tokio::test]
    async fn episode_round_trip() {
        let (_dir, layout, store) = setup();
        let writer = RecordWriter::new(store.clone(), layout.clone());
        let show = ShowId::new();
        let bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        let episode = writer
            .write_episode(Upload::from_bytes("02.MP4", bytes.clone()), show)
            .await
            .unwrap();

        assert_eq!(episode.file_name, format!("{}.mp4", episode.id));
        assert_eq!(episode.episode_number, 2);
        assert_eq!(episode.parent_id, show);

        let on_disk = std::fs::read(layout.blob_path(BlobCollection::Videos, &episode.file_name)).unwrap();
        assert_eq!(on_disk, bytes);
        assert_eq!(store.episodes_by_show(show).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn movie_and_cover_round_trip() {
        let (_dir, layout, store) = setup();
        let writer = RecordWriter::new(store.clone(), layout.clone());
        let meta = MovieMeta {
            title: "Alien".into(),
            description: "In space".into(),
            hidden: false,
        };

        let movie = writer
            .write_movie(Upload::from_bytes("alien.mkv", b"movie".to_vec()), &meta)
            .await
            .unwrap();
        let cover = writer
            .write_cover(Upload::from_bytes("poster.jpg", b"jpeg".to_vec()), CoverParent::Movie(movie.id))
            .await
            .unwrap();

        assert_eq!(movie.title, "Alien");
        assert_eq!(cover.parent_id, movie.id.to_string());
        assert_eq!(cover.parent_kind, ParentKind::Movie);
        assert_eq!(
            std::fs::read(layout.blob_path(BlobCollection::Covers, &cover.file_name)).unwrap(),
            b"jpeg"
        );
        assert!(store.cover_by_parent(&movie.id.to_string()).unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_directories_are_created() {
        let (_dir, layout, store) = setup();
        assert!(!layout.collection_dir(BlobCollection::Videos).exists());
        let writer = RecordWriter::new(store, layout.clone());
        writer
            .write_episode(Upload::from_bytes("1.mp4", b"x".to_vec()), ShowId::new())
            .await
            .unwrap();
        assert!(layout.collection_dir(BlobCollection::Videos).is_dir());
    }

    /// Store whose inserts always fail.
    struct RejectingStore {
        inserts: Mutex<u32>,
    }

    impl EntityStore for RejectingStore {
        fn insert_episode(&self, _: &Episode) -> Result<()> {
            *self.inserts.lock() += 1;
            Err(Error::database("disk I/O error"))
        }
        fn insert_movie(&self, _: &Movie) -> Result<()> {
            *self.inserts.lock() += 1;
            Err(Error::database("disk I/O error"))
        }
        fn insert_cover(&self, _: &Cover) -> Result<()> {
            *self.inserts.lock() += 1;
            Err(Error::database("disk I/O error"))
        }
        fn episode(&self, _: EpisodeId) -> Result<Option<Episode>> {
            Ok(None)
        }
        fn movie(&self, _: MovieId) -> Result<Option<Movie>> {
            Ok(None)
        }
        fn episodes_by_show(&self, _: ShowId) -> Result<Vec<Episode>> {
            Ok(Vec::new())
        }
        fn cover_by_parent(&self, _: &str) -> Result<Option<Cover>> {
            Ok(None)
        }
        fn delete_episodes_by_show(&self, _: ShowId) -> Result<usize> {
            Ok(0)
        }
        fn delete_episode(&self, _: EpisodeId) -> Result<bool> {
            Ok(false)
        }
        fn delete_cover(&self, _: CoverId) -> Result<bool> {
            Ok(false)
        }
        fn delete_show(&self, _: ShowId) -> Result<bool> {
            Ok(false)
        }
        fn delete_movie(&self, _: MovieId) -> Result<bool> {
            Ok(false)
        }
        fn refresh_episode_count(&self, _: ShowId) -> Result<()> {
            Ok(())
        }
        fn blob_refs(&self, _: BlobCollection) -> Result<Vec<BlobRef>> {
            Ok(Vec::new())
        }
    }

    fn dir_entries(path: PathBuf) -> usize {
        std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn failed_insert_writes_no_blob() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let store = Arc::new(RejectingStore {
            inserts: Mutex::new(0),
        });
        let writer = RecordWriter::new(store.clone(), layout.clone());

        let err = writer
            .write_episode(Upload::from_bytes("1.mp4", b"data".to_vec()), ShowId::new())
            .await
            .unwrap_err();

        assert_matches!(err, Error::Database { .. });
        assert_eq!(*store.inserts.lock(), 1);
        assert_eq!(dir_entries(layout.collection_dir(BlobCollection::Videos)), 0);
    }

    /// Reader that fails after yielding nothing.
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("connection reset")))
        }
    }

    #[tokio::test]
    async fn failed_blob_write_leaves_dangling_row() {
        let (_dir, layout, store) = setup();
        let writer = RecordWriter::new(store.clone(), layout.clone());
        let show = ShowId::new();

        let err = writer
            .write_episode(Upload::new("5.mp4", BrokenReader), show)
            .await
            .unwrap_err();

        let (entity, file_name) = match err {
            Error::PartialUpload { entity, file_name, .. } => (entity, file_name),
            other => panic!("expected PartialUpload, got {other:?}"),
        };
        assert_eq!(entity, "episode");

        let rows = store.episodes_by_show(show).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_name, file_name);
        assert!(!layout.blob_path(BlobCollection::Videos, &file_name).exists());
    }

    #[tokio::test]
    async fn bad_extension_touches_nothing() {
        let (_dir, layout, store) = setup();
        let writer = RecordWriter::new(store.clone(), layout.clone());
        let show = ShowId::new();

        let err = writer
            .write_episode(Upload::from_bytes("README", b"x".to_vec()), show)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(store.episodes_by_show(show).unwrap().is_empty());
        assert!(!layout.collection_dir(BlobCollection::Videos).exists());
    }
}
