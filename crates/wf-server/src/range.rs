//! Range request planning.
//!
//! [`plan`] turns an optional `Range` header and the size of the blob into
//! the window the streamer should serve. It never touches I/O.
//!
//! Partial responses advertise at most one [`CHUNK_SIZE`] window in
//! `Content-Range`, starting at the requested first byte. An explicit last
//! byte from the client is accepted but ignored, so players that ask for
//! `bytes=0-` and players that ask for `bytes=0-99` see the same window.

use axum::http::StatusCode;
use wf_core::{Error, Result};

/// Size of the window advertised for partial responses.
pub const CHUNK_SIZE: u64 = 1_000_000;

/// How a request for a blob of a known size is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// `200 OK` for whole-object plans, `206 Partial Content` otherwise.
    pub status: StatusCode,
    /// First byte served.
    pub start: u64,
    /// Last byte advertised in `Content-Range`.
    pub end: u64,
    /// Value of `Content-Length`: every byte from `start` to the end of the
    /// object.
    pub length: u64,
    /// `Content-Range` header value for partial plans.
    pub content_range: Option<String>,
}

/// Plan the response for `range` against an object of `total` bytes.
pub fn plan(range: Option<&str>, total: u64) -> Result<Plan> {
    let Some(range) = range.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Plan {
            status: StatusCode::OK,
            start: 0,
            end: total.saturating_sub(1),
            length: total,
            content_range: None,
        });
    };

    let start = parse_start(range)?;
    if start >= total {
        return Err(Error::RangeNotSatisfiable { start, size: total });
    }

    let end = start.saturating_add(CHUNK_SIZE - 1).min(total - 1);

    Ok(Plan {
        status: StatusCode::PARTIAL_CONTENT,
        start,
        end,
        length: total - start,
        content_range: Some(format!("bytes {start}-{end}/{total}")),
    })
}

/// Parse the first byte out of `bytes=<start>-[<end>]`.
fn parse_start(range: &str) -> Result<u64> {
    let invalid = || Error::InvalidRange(range.to_string());

    let spec = range.strip_prefix("bytes=").ok_or_else(invalid)?;
    let (start, end) = spec.split_once('-').ok_or_else(invalid)?;

    let start = start.trim();
    if start.is_empty() || !start.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let end = end.trim();
    if !end.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    start.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn no_header_serves_everything() {
        let p = plan(None, 5_000_000).unwrap();
        assert_eq!(p.status, StatusCode::OK);
        assert_eq!((p.start, p.end, p.length), (0, 4_999_999, 5_000_000));
        assert!(p.content_range.is_none());
    }

    #[test]
    fn empty_header_is_treated_as_absent() {
        assert_eq!(plan(Some("  "), 10).unwrap().status, StatusCode::OK);
    }

    #[test]
    fn open_ended_range_gets_one_chunk() {
        let p = plan(Some("bytes=2000000-"), 5_000_000).unwrap();
        assert_eq!(p.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!((p.start, p.end), (2_000_000, 2_999_999));
        assert_eq!(p.length, 3_000_000);
        assert_eq!(p.content_range.as_deref(), Some("bytes 2000000-2999999/5000000"));
    }

    #[test]
    fn window_is_clamped_to_last_byte() {
        let p = plan(Some("bytes=4500000-"), 5_000_000).unwrap();
        assert_eq!(p.end, 4_999_999);
        assert_eq!(p.length, 500_000);
    }

    #[test]
    fn client_end_is_ignored() {
        let explicit = plan(Some("bytes=0-99"), 5_000_000).unwrap();
        let open = plan(Some("bytes=0-"), 5_000_000).unwrap();
        assert_eq!(explicit, open);
        assert_eq!(explicit.end, 999_999);
    }

    #[test]
    fn last_byte_is_satisfiable() {
        let p = plan(Some("bytes=9-"), 10).unwrap();
        assert_eq!((p.start, p.end, p.length), (9, 9, 1));
    }

    #[test]
    fn start_past_end_is_not_satisfiable() {
        assert_matches!(
            plan(Some("bytes=10-"), 10),
            Err(Error::RangeNotSatisfiable { start: 10, size: 10 })
        );
        assert_matches!(
            plan(Some("bytes=0-"), 0),
            Err(Error::RangeNotSatisfiable { .. })
        );
    }

    #[test]
    fn empty_object_without_range() {
        let p = plan(None, 0).unwrap();
        assert_eq!((p.start, p.end, p.length), (0, 0, 0));
        assert_eq!(p.status, StatusCode::OK);
    }

    #[test]
    fn malformed_headers_are_invalid() {
        for header in [
            "bytes=abc-",
            "bytes=-500",
            "items=0-",
            "bytes=12",
            "bytes=0-1,5-6",
            "bytes=99999999999999999999999-",
        ] {
            assert_matches!(plan(Some(header), 100), Err(Error::InvalidRange(_)), "{header}");
        }
    }

    #[test]
    fn window_never_exceeds_one_chunk() {
        let totals = [1u64, 2, 999_999, 1_000_000, 1_000_001, 7_340_033];
        for total in totals {
            let starts = [0, 1, total / 3, total / 2, total.saturating_sub(2), total - 1];
            for start in starts.into_iter().filter(|&s| s < total) {
                let header = format!("bytes={start}-");
                let p = plan(Some(&header), total).unwrap();
                assert!(p.start <= p.end && p.end <= total - 1, "{total} {start}");
                assert!(p.end - p.start + 1 <= CHUNK_SIZE);
                assert_eq!(p.length, total - start);
            }
            assert_matches!(
                plan(Some(&format!("bytes={total}-")), total),
                Err(Error::RangeNotSatisfiable { .. })
            );
        }
    }
}
