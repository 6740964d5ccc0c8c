//! Video streaming with range support.

use std::io;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use serde::Deserialize;
use wf_core::{BlobCollection, EpisodeId, Error, MovieId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::{range, streamer};

/// Longest accepted `type` query value.
const MAX_TYPE_LEN: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/v1/stream/{id}?type=show|movie
///
/// `type=show` resolves `id` as an episode; anything else as a movie.
pub async fn stream_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let kind = query.kind.unwrap_or_default();
    if kind.chars().count() > MAX_TYPE_LEN {
        return Err(Error::InvalidRequest(format!(
            "type must be at most {MAX_TYPE_LEN} characters"
        ))
        .into());
    }

    let range = headers
        .get(header::RANGE)
        .map(|v| {
            v.to_str()
                .map_err(|_| Error::InvalidRange("range header is not ASCII".into()))
        })
        .transpose()?;

    let file_name = blob_name(&ctx, &kind, &id)?;
    let path = ctx.layout.blob_path(BlobCollection::Videos, &file_name);
    let (file, size) = streamer::open(&path).await?;
    let plan = range::plan(range, size)?;

    tracing::debug!(id = %id, kind = %kind, start = plan.start, size, "Streaming video");
    Ok(streamer::stream(file, &plan, BlobCollection::Videos).await?)
}

/// Blob name of the episode or movie behind `id`. A missing row is
/// reported as unavailable media.
fn blob_name(ctx: &AppContext, kind: &str, id: &str) -> wf_core::Result<String> {
    let found = if kind == "show" {
        let id = EpisodeId::parse(id)?;
        ctx.store.episode(id)?.map(|e| e.file_name)
    } else {
        let id = MovieId::parse(id)?;
        ctx.store.movie(id)?.map(|m| m.file_name)
    };

    found.ok_or_else(|| Error::MediaUnavailable {
        path: format!("{} {id}", if kind == "show" { "episode" } else { "movie" }),
        source: io::Error::new(io::ErrorKind::NotFound, "no matching row"),
    })
}
