//! Cover route handlers for shows and movies.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use wf_core::{BlobCollection, CoverParent, Error, MovieId, ShowId};
use wf_db::models::Cover;
use wf_db::pool::get_conn;
use wf_db::queries::shows;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::{delete_outcome, DeleteResponse};
use crate::upload::stage_form;
use crate::{placeholder, range, streamer};

pub(crate) const COVER_FIELD: &str = "cover";

fn show_parent(id: &str) -> wf_core::Result<CoverParent> {
    Ok(CoverParent::Show(ShowId::parse(id)?))
}

fn movie_parent(id: &str) -> wf_core::Result<CoverParent> {
    Ok(CoverParent::Movie(MovieId::parse(id)?))
}

/// GET /api/v1/shows/{id}/cover
pub async fn get_show_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    read_cover(&ctx, show_parent(&id)?).await
}

/// GET /api/v1/movies/{id}/cover
pub async fn get_movie_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    read_cover(&ctx, movie_parent(&id)?).await
}

/// PUT /api/v1/shows/{id}/cover
pub async fn put_show_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Cover>, AppError> {
    replace_cover(&ctx, show_parent(&id)?, multipart).await
}

/// PUT /api/v1/movies/{id}/cover
pub async fn put_movie_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Cover>, AppError> {
    replace_cover(&ctx, movie_parent(&id)?, multipart).await
}

/// DELETE /api/v1/shows/{id}/cover
pub async fn delete_show_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let parent = show_parent(&id)?;
    delete_outcome("cover", &id, ctx.deleter.delete_cover(parent).await)
}

/// DELETE /api/v1/movies/{id}/cover
pub async fn delete_movie_cover(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let parent = movie_parent(&id)?;
    delete_outcome("cover", &id, ctx.deleter.delete_cover(parent).await)
}

/// Serve the stored cover, or the placeholder when the row or blob is
/// missing.
async fn read_cover(ctx: &AppContext, parent: CoverParent) -> Result<Response, AppError> {
    let Some(cover) = ctx.store.cover_by_parent(&parent.to_string())? else {
        tracing::debug!(parent = %parent, kind = %parent.kind(), "No cover row; serving placeholder");
        return placeholder_response();
    };

    let path = ctx.layout.blob_path(BlobCollection::Covers, &cover.file_name);
    match streamer::open(&path).await {
        Ok((file, size)) => {
            let plan = range::plan(None, size)?;
            Ok(streamer::stream(file, &plan, BlobCollection::Covers).await?)
        }
        Err(e) => {
            tracing::warn!(parent = %parent, error = %e, "Cover blob unavailable; serving placeholder");
            placeholder_response()
        }
    }
}

fn placeholder_response() -> Result<Response, AppError> {
    let bytes = placeholder::cover()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, BlobCollection::Covers.content_type())],
        bytes,
    )
        .into_response())
}

async fn replace_cover(
    ctx: &AppContext,
    parent: CoverParent,
    mut multipart: Multipart,
) -> Result<Json<Cover>, AppError> {
    ensure_parent(ctx, parent)?;

    let mut form = stage_form(
        &mut multipart,
        &ctx.layout.staging_dir(),
        ctx.config.uploads.max_form_bytes,
    )
    .await?;
    let Some(file) = form.take_files(COVER_FIELD).into_iter().next() else {
        return Err(Error::InvalidRequest("No uploaded cover present in form".into()).into());
    };

    if ctx.store.cover_by_parent(&parent.to_string())?.is_some() {
        ctx.deleter.delete_cover(parent).await?;
    }
    let cover = ctx.writer.write_cover(file.into_upload().await?, parent).await?;
    Ok(Json(cover))
}

fn ensure_parent(ctx: &AppContext, parent: CoverParent) -> wf_core::Result<()> {
    let exists = match parent {
        CoverParent::Show(id) => {
            let conn = get_conn(&ctx.db)?;
            shows::get_show(&conn, id)?.is_some()
        }
        CoverParent::Movie(id) => ctx.store.movie(id)?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(Error::not_found(parent.kind().as_str(), parent))
    }
}
