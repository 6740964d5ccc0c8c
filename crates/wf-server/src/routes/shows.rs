//! Show route handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use wf_core::{CoverParent, Error, ShowId};
use wf_db::models::{Cover, Episode, Show};
use wf_db::pool::get_conn;
use wf_db::queries::{shows, MetadataUpdate};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::covers::COVER_FIELD;
use crate::routes::episodes::{write_episodes, VIDEOS_FIELD};
use crate::routes::{delete_outcome, DeleteResponse, ListQuery, LIST_LIMIT};
use crate::upload::stage_form;

/// A show together with its episodes and cover.
#[derive(Debug, Serialize)]
pub struct ShowDetail {
    #[serde(flatten)]
    pub show: Show,
    pub episodes: Vec<Episode>,
    pub cover: Option<Cover>,
}

/// GET /api/v1/shows
pub async fn list_shows(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Show>>, AppError> {
    let conn = get_conn(&ctx.db)?;
    Ok(Json(shows::list_shows(&conn, query.order(), LIST_LIMIT)?))
}

/// GET /api/v1/shows/{id}
pub async fn get_show(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ShowDetail>, AppError> {
    let show_id = ShowId::parse(&id)?;
    let show = {
        let conn = get_conn(&ctx.db)?;
        shows::get_show(&conn, show_id)?.ok_or_else(|| Error::not_found("show", show_id))?
    };

    Ok(Json(ShowDetail {
        episodes: ctx.store.episodes_by_show(show_id)?,
        cover: ctx.store.cover_by_parent(&show_id.to_string())?,
        show,
    }))
}

/// PUT /api/v1/shows/{id}
pub async fn update_show(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(update): Json<MetadataUpdate>,
) -> Result<Json<Show>, AppError> {
    let show_id = ShowId::parse(&id)?;
    if update.is_empty() {
        return Err(Error::InvalidRequest("no fields to update".into()).into());
    }

    let conn = get_conn(&ctx.db)?;
    let show = shows::update_show(&conn, show_id, &update)?
        .ok_or_else(|| Error::not_found("show", show_id))?;
    Ok(Json(show))
}

/// POST /api/v1/shows
///
/// Multipart fields: `title`, `description`, `hidden`, one `cover` file and
/// one or more `videos` files. The form is validated before anything is
/// written. Episodes are stored first, then the cover. The show row is only
/// recorded once at least one episode exists; a later failure is returned
/// after the row is in place so the show can be deleted as a whole.
pub async fn create_show(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ShowDetail>), AppError> {
    let mut form = stage_form(
        &mut multipart,
        &ctx.layout.staging_dir(),
        ctx.config.uploads.max_form_bytes,
    )
    .await?;

    let Some(cover) = form.take_files(COVER_FIELD).into_iter().next() else {
        return Err(Error::InvalidRequest("No uploaded cover present in form".into()).into());
    };
    let videos = form.take_files(VIDEOS_FIELD);
    if videos.is_empty() {
        return Err(Error::InvalidRequest("No uploaded videos present in form".into()).into());
    }
    cover.extension()?;
    for video in &videos {
        video.extension()?;
    }

    let show_id = ShowId::new();
    let (episodes, mut failure) = write_episodes(&ctx, show_id, videos).await;
    if episodes.is_empty() {
        tracing::error!(show_id = %show_id, "No episode stored; show not recorded");
        let err = failure.unwrap_or_else(|| Error::Internal("no episode was stored".into()));
        return Err(err.into());
    }

    let cover = match cover.into_upload().await {
        Ok(upload) => ctx.writer.write_cover(upload, CoverParent::Show(show_id)).await,
        Err(e) => Err(e),
    };
    let cover = match cover {
        Ok(cover) => Some(cover),
        Err(e) => {
            failure.get_or_insert(e);
            None
        }
    };

    let mut show = {
        let conn = get_conn(&ctx.db)?;
        shows::create_show(
            &conn,
            show_id,
            form.text("title").unwrap_or_default(),
            form.text("description").unwrap_or_default(),
            form.flag("hidden"),
        )?
    };
    ctx.store.refresh_episode_count(show_id)?;
    show.episode_count = episodes.len() as i64;

    if let Some(e) = failure {
        tracing::error!(show_id = %show_id, written = episodes.len(), error = %e, "Show upload stopped early");
        return Err(e.into());
    }

    tracing::info!(show_id = %show_id, episodes = episodes.len(), "Created show");
    Ok((
        StatusCode::CREATED,
        Json(ShowDetail {
            show,
            episodes,
            cover,
        }),
    ))
}

/// DELETE /api/v1/shows/{id}
pub async fn delete_show(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    delete_outcome("show", &id, ctx.deleter.delete_show(&id).await)
}
