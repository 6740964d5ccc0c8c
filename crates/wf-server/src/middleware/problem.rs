//! Fills the `instance` member of problem documents with the request path.

use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::Problem;

pub async fn problem_instance_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(problem) = response.extensions().get::<Problem>() else {
        return response;
    };
    if !problem.instance.is_empty() {
        return response;
    }
    let problem = Problem {
        instance: path,
        ..problem.clone()
    };

    let (mut parts, _) = response.into_parts();
    let body = serde_json::to_vec(&problem).unwrap_or_default();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(problem);
    Response::from_parts(parts, Body::from(body))
}
