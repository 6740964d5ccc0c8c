//! Integration tests for cover reads, replacement and removal.

mod common;

use common::{create_movie, create_show, file_part, media_bytes, TestHarness};
use reqwest::multipart::Form;
use wf_core::{BlobCollection, ShowId};

#[tokio::test]
async fn stored_cover_is_served() {
    let (_h, addr) = TestHarness::with_server().await;
    let show = create_show(addr, "Covered", &[("01.mp4", media_bytes(8))]).await;
    let id = show["id"].as_str().unwrap();

    let resp = reqwest::get(format!("http://{addr}/api/v1/shows/{id}/cover"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"cover-bytes");
}

#[tokio::test]
async fn missing_cover_falls_back_to_placeholder() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!(
        "http://{addr}/api/v1/shows/{}/cover",
        ShowId::new()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn missing_cover_blob_falls_back_to_placeholder() {
    let (h, addr) = TestHarness::with_server().await;
    let movie = create_movie(addr, "Lost poster", media_bytes(8)).await;
    let id = movie["id"].as_str().unwrap();
    std::fs::remove_file(h.blob_path(
        BlobCollection::Covers,
        movie["cover"]["file_name"].as_str().unwrap(),
    ))
    .unwrap();

    let resp = reqwest::get(format!("http://{addr}/api/v1/movies/{id}/cover"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.unwrap();
    assert_ne!(body.as_ref(), b"poster-bytes");
    assert_eq!(&body[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn replace_cover() {
    let (h, addr) = TestHarness::with_server().await;
    let show = create_show(addr, "Recover", &[("01.mp4", media_bytes(8))]).await;
    let id = show["id"].as_str().unwrap();
    let old = show["cover"]["file_name"].as_str().unwrap().to_string();

    let form = Form::new().part("cover", file_part("new.png", b"new-cover".to_vec()));
    let resp = reqwest::Client::new()
        .put(format!("http://{addr}/api/v1/shows/{id}/cover"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cover: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(cover["file_extension"], "png");

    let covers = h.blobs(BlobCollection::Covers);
    assert_eq!(covers.len(), 1);
    assert_ne!(covers[0], old);

    let body = reqwest::get(format!("http://{addr}/api/v1/shows/{id}/cover"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(body.as_ref(), b"new-cover");
}

#[tokio::test]
async fn replace_cover_of_unknown_parent_is_404() {
    let (h, addr) = TestHarness::with_server().await;
    let form = Form::new().part("cover", file_part("c.jpg", b"img".to_vec()));
    let resp = reqwest::Client::new()
        .put(format!("http://{addr}/api/v1/shows/{}/cover", ShowId::new()))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(h.blobs(BlobCollection::Covers).is_empty());
}

#[tokio::test]
async fn delete_cover_then_delete_again() {
    let (h, addr) = TestHarness::with_server().await;
    let movie = create_movie(addr, "Bare", media_bytes(8)).await;
    let id = movie["id"].as_str().unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("http://{addr}/api/v1/movies/{id}/cover"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(h.blobs(BlobCollection::Covers).is_empty());

    let resp = client
        .delete(format!("http://{addr}/api/v1/movies/{id}/cover"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
