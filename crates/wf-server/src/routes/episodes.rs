//! Episode route handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use wf_core::{Error, ShowId};
use wf_db::models::Episode;
use wf_db::pool::get_conn;
use wf_db::queries::shows;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::{delete_outcome, DeleteResponse};
use crate::upload::{stage_form, StagedFile};

pub(crate) const VIDEOS_FIELD: &str = "videos";

/// Write `files` as episodes of `show` in form order, stopping at the first
/// failure. Returns what was written and the failure, if any. The cached
/// episode count is refreshed either way.
pub(crate) async fn write_episodes(
    ctx: &AppContext,
    show: ShowId,
    files: Vec<StagedFile>,
) -> (Vec<Episode>, Option<Error>) {
    let mut written = Vec::with_capacity(files.len());
    let mut failure = None;

    for file in files {
        let result = match file.into_upload().await {
            Ok(upload) => ctx.writer.write_episode(upload, show).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(episode) => written.push(episode),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if let Err(e) = ctx.store.refresh_episode_count(show) {
        tracing::warn!(show_id = %show, error = %e, "Failed to refresh episode count");
        failure.get_or_insert(e);
    }
    (written, failure)
}

/// GET /api/v1/shows/{id}/episodes
pub async fn list_episodes(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Episode>>, AppError> {
    let show_id = ShowId::parse(&id)?;
    {
        let conn = get_conn(&ctx.db)?;
        shows::get_show(&conn, show_id)?.ok_or_else(|| Error::not_found("show", show_id))?;
    }
    Ok(Json(ctx.store.episodes_by_show(show_id)?))
}

/// POST /api/v1/shows/{id}/episodes
pub async fn add_episodes(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Episode>>), AppError> {
    let show_id = ShowId::parse(&id)?;
    {
        let conn = get_conn(&ctx.db)?;
        shows::get_show(&conn, show_id)?.ok_or_else(|| Error::not_found("show", show_id))?;
    }

    let mut form = stage_form(
        &mut multipart,
        &ctx.layout.staging_dir(),
        ctx.config.uploads.max_form_bytes,
    )
    .await?;
    let files = form.take_files(VIDEOS_FIELD);
    if files.is_empty() {
        return Err(Error::InvalidRequest("No uploaded videos present in form".into()).into());
    }

    let (episodes, failure) = write_episodes(&ctx, show_id, files).await;
    if let Some(e) = failure {
        return Err(e.into());
    }
    Ok((StatusCode::CREATED, Json(episodes)))
}

/// DELETE /api/v1/episodes/{id}
pub async fn delete_episode(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    delete_outcome("episode", &id, ctx.deleter.delete_episode(&id).await)
}
