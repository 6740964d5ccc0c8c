//! HTTP middleware: request ID and problem document completion.

pub mod problem;
pub mod request_id;
