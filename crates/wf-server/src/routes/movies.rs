//! Movie route handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use wf_core::{CoverParent, Error, MovieId};
use wf_db::models::{Cover, Movie};
use wf_db::pool::get_conn;
use wf_db::queries::{movies, MetadataUpdate};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::covers::COVER_FIELD;
use crate::routes::episodes::VIDEOS_FIELD;
use crate::routes::{delete_outcome, DeleteResponse, ListQuery, LIST_LIMIT};
use crate::upload::stage_form;
use crate::writer::MovieMeta;

const VIDEO_FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub cover: Option<Cover>,
}

/// GET /api/v1/movies
pub async fn list_movies(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let conn = get_conn(&ctx.db)?;
    Ok(Json(movies::list_movies(&conn, query.order(), LIST_LIMIT)?))
}

/// GET /api/v1/movies/{id}
pub async fn get_movie(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<MovieDetail>, AppError> {
    let movie_id = MovieId::parse(&id)?;
    let movie = ctx
        .store
        .movie(movie_id)?
        .ok_or_else(|| Error::not_found("movie", movie_id))?;

    Ok(Json(MovieDetail {
        cover: ctx.store.cover_by_parent(&movie_id.to_string())?,
        movie,
    }))
}

/// PUT /api/v1/movies/{id}
pub async fn update_movie(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(update): Json<MetadataUpdate>,
) -> Result<Json<Movie>, AppError> {
    let movie_id = MovieId::parse(&id)?;
    if update.is_empty() {
        return Err(Error::InvalidRequest("no fields to update".into()).into());
    }

    let conn = get_conn(&ctx.db)?;
    let movie = movies::update_movie(&conn, movie_id, &update)?
        .ok_or_else(|| Error::not_found("movie", movie_id))?;
    Ok(Json(movie))
}

/// POST /api/v1/movies
///
/// Multipart fields: `title`, `description`, `hidden`, one `cover` file and
/// one `video` file (the first `videos` file is accepted too). Both file
/// names are checked before the movie row is written.
pub async fn create_movie(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MovieDetail>), AppError> {
    let mut form = stage_form(
        &mut multipart,
        &ctx.layout.staging_dir(),
        ctx.config.uploads.max_form_bytes,
    )
    .await?;

    let Some(cover) = form.take_files(COVER_FIELD).into_iter().next() else {
        return Err(Error::InvalidRequest("No uploaded cover present in form".into()).into());
    };
    let mut video = form.take_files(VIDEO_FIELD).into_iter().next();
    if video.is_none() {
        video = form.take_files(VIDEOS_FIELD).into_iter().next();
    }
    let Some(video) = video else {
        return Err(Error::InvalidRequest("No uploaded videos present in form".into()).into());
    };
    cover.extension()?;
    video.extension()?;

    let meta = MovieMeta {
        title: form.text("title").unwrap_or_default().to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
        hidden: form.flag("hidden"),
    };

    let movie = ctx
        .writer
        .write_movie(video.into_upload().await?, &meta)
        .await?;
    let cover = ctx
        .writer
        .write_cover(cover.into_upload().await?, CoverParent::Movie(movie.id))
        .await?;

    tracing::info!(movie_id = %movie.id, "Created movie");
    Ok((
        StatusCode::CREATED,
        Json(MovieDetail {
            movie,
            cover: Some(cover),
        }),
    ))
}

/// DELETE /api/v1/movies/{id}
pub async fn delete_movie(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    delete_outcome("movie", &id, ctx.deleter.delete_movie(&id).await)
}
