//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary
//! application directory and a full [`AppContext`]. The [`with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use tempfile::TempDir;
use wf_core::config::Config;
use wf_core::BlobCollection;
use wf_db::pool::{init_memory_pool, DbPool};
use wf_server::context::AppContext;
use wf_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary application directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub app_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// The app directory in `config` is replaced with a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let app_dir = tempfile::tempdir().expect("failed to create app dir");
        config.storage.app_dir = app_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(db.clone(), config);
        Self { ctx, db, app_dir }
    }

    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn blob_path(&self, collection: BlobCollection, file_name: &str) -> PathBuf {
        self.ctx.layout.blob_path(collection, file_name)
    }

    /// File names currently stored in a collection.
    pub fn blobs(&self, collection: BlobCollection) -> Vec<String> {
        let dir = self.ctx.layout.collection_dir(collection);
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Deterministic fake media content.
pub fn media_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn file_part(name: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes).file_name(name.to_string())
}

/// Multipart form for `POST /shows` with a cover and the given episodes.
pub fn show_form(title: &str, episodes: &[(&str, Vec<u8>)]) -> Form {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("description", "A test show")
        .part("cover", file_part("cover.jpg", b"cover-bytes".to_vec()));
    for (name, bytes) in episodes {
        form = form.part("videos", file_part(name, bytes.clone()));
    }
    form
}

/// Multipart form for `POST /movies`.
pub fn movie_form(title: &str, video: Vec<u8>) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", "A test movie")
        .part("cover", file_part("poster.jpg", b"poster-bytes".to_vec()))
        .part("video", file_part("movie.mp4", video))
}

/// Create a show over HTTP and return its JSON body.
pub async fn create_show(
    addr: SocketAddr,
    title: &str,
    episodes: &[(&str, Vec<u8>)],
) -> serde_json::Value {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/shows"))
        .multipart(show_form(title, episodes))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

/// Create a movie over HTTP and return its JSON body.
pub async fn create_movie(addr: SocketAddr, title: &str, video: Vec<u8>) -> serde_json::Value {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/movies"))
        .multipart(movie_form(title, video))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}
