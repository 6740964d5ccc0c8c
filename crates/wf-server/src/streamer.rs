//! Media streaming: positions a blob at the planned offset and hands it to
//! the response body.
//!
//! The source is owned by the body stream. When the client disconnects,
//! hyper drops the body, which drops the stream and closes the file handle;
//! no explicit cancellation is needed.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use wf_core::{BlobCollection, Error, Result};

use crate::range::Plan;

/// Read size for the body stream.
const READ_CAPACITY: usize = 64 * 1024;

/// Open a blob for streaming and return it with its size.
pub async fn open(path: &Path) -> Result<(tokio::fs::File, u64)> {
    let unavailable = |source: io::Error| Error::MediaUnavailable {
        path: path.display().to_string(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(unavailable)?;
    let metadata = file.metadata().await.map_err(unavailable)?;
    if !metadata.is_file() {
        return Err(unavailable(io::Error::other("not a regular file")));
    }
    Ok((file, metadata.len()))
}

/// Build the response for `plan`, reading `source` from `plan.start` until
/// end of stream.
pub async fn stream<S>(mut source: S, plan: &Plan, collection: BlobCollection) -> Result<Response>
where
    S: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    if plan.start > 0 {
        source
            .seek(io::SeekFrom::Start(plan.start))
            .await
            .map_err(|source| Error::MediaUnavailable {
                path: format!("{collection} blob at offset {}", plan.start),
                source,
            })?;
    }

    let body = Body::from_stream(TrackedStream::new(source, plan.length));

    let mut response = (plan.status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(collection.content_type()),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(plan.length));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(range) = &plan.content_range {
        let value = HeaderValue::from_str(range)
            .map_err(|e| Error::Internal(format!("invalid Content-Range '{range}': {e}")))?;
        headers.insert(header::CONTENT_RANGE, value);
    }
    Ok(response)
}

/// A [`ReaderStream`] that counts what it yields and logs the outcome when
/// the body is dropped.
struct TrackedStream<S> {
    inner: ReaderStream<S>,
    sent: u64,
    expected: u64,
    done: bool,
}

impl<S: AsyncRead> TrackedStream<S> {
    fn new(source: S, expected: u64) -> Self {
        Self {
            inner: ReaderStream::with_capacity(source, READ_CAPACITY),
            sent: 0,
            expected,
            done: false,
        }
    }
}

impl<S: AsyncRead + Unpin> Stream for TrackedStream<S> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(sent = this.sent, error = %e, "Media read failed mid-stream");
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> Drop for TrackedStream<S> {
    fn drop(&mut self) {
        if self.done {
            tracing::debug!(sent = self.sent, expected = self.expected, "Media stream finished");
        } else {
            tracing::debug!(
                sent = self.sent,
                expected = self.expected,
                "Media stream dropped before completion"
            );
        }
    }
}
