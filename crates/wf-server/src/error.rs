//! Error-to-HTTP response conversion.
//!
//! Every failed request is answered with an RFC 7807 problem document. The
//! `instance` member is filled in by [`crate::middleware::problem`], which
//! knows the request path.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
}

impl Problem {
    pub fn from_error(err: &wf_core::Error) -> Self {
        Self {
            kind: "about:blank".to_string(),
            title: err.title().to_string(),
            status: err.http_status(),
            detail: err.to_string(),
            instance: String::new(),
        }
    }

    /// Render as a response with the problem headers.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let body = serde_json::to_vec(&self).unwrap_or_default();
        let mut response = (status, body).into_response();

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        headers.insert(header::CONTENT_LANGUAGE, HeaderValue::from_static("en"));
        response.extensions_mut().insert(self);
        response
    }
}

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub wf_core::Error);

impl From<wf_core::Error> for AppError {
    fn from(e: wf_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        let mut response = Problem::from_error(&self.0).into_response_with(status);

        if let wf_core::Error::RangeNotSatisfiable { size, .. } = &self.0 {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use wf_core::{DeleteStage, Error};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_is_a_problem_document() {
        let response = AppError(Error::not_found("show", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_CONTENT_TYPE);
        assert_eq!(response.headers()[header::CONTENT_LANGUAGE], "en");
        assert!(response.extensions().get::<Problem>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Data not found");
        assert_eq!(body["status"], 404);
        assert!(body["detail"].as_str().unwrap().contains("abc"));
    }

    #[test]
    fn unsatisfiable_range_reports_size() {
        let response =
            AppError(Error::RangeNotSatisfiable { start: 50, size: 10 }).into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */10");
    }

    #[test]
    fn cascade_uses_inner_status() {
        let err = Error::cascade(
            DeleteStage::Validate,
            "x",
            Error::InvalidRequest("bad".into()),
        );
        assert_eq!(AppError(err).into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_is_500() {
        let response = AppError(Error::Internal("oops".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
