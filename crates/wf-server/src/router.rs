//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::problem::problem_instance_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = DefaultBodyLimit::max(
        usize::try_from(ctx.config.uploads.max_form_bytes).unwrap_or(usize::MAX),
    );

    // Multipart routes take the configured form limit.
    let uploads = Router::new()
        .route(
            "/shows",
            get(routes::shows::list_shows).post(routes::shows::create_show),
        )
        .route(
            "/shows/{id}/episodes",
            get(routes::episodes::list_episodes).post(routes::episodes::add_episodes),
        )
        .route(
            "/shows/{id}/cover",
            get(routes::covers::get_show_cover)
                .put(routes::covers::put_show_cover)
                .delete(routes::covers::delete_show_cover),
        )
        .route(
            "/movies",
            get(routes::movies::list_movies).post(routes::movies::create_movie),
        )
        .route(
            "/movies/{id}/cover",
            get(routes::covers::get_movie_cover)
                .put(routes::covers::put_movie_cover)
                .delete(routes::covers::delete_movie_cover),
        )
        .layer(upload_limit);

    let api = Router::new()
        .route("/stream/{id}", get(routes::stream::stream_video))
        .route(
            "/shows/{id}",
            get(routes::shows::get_show)
                .put(routes::shows::update_show)
                .delete(routes::shows::delete_show),
        )
        .route(
            "/movies/{id}",
            get(routes::movies::get_movie)
                .put(routes::movies::update_movie)
                .delete(routes::movies::delete_movie),
        )
        .route("/episodes/{id}", delete(routes::episodes::delete_episode))
        .route("/admin/audit", get(routes::admin::storage_audit))
        .merge(uploads);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(problem_instance_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}
