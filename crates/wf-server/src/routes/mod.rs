//! Route handlers for the HTTP API.

pub mod admin;
pub mod covers;
pub mod episodes;
pub mod health;
pub mod movies;
pub mod shows;
pub mod stream;

use axum::Json;
use serde::{Deserialize, Serialize};
use wf_db::queries::ListOrder;

use crate::cascade::DeleteReport;
use crate::error::AppError;

/// Number of rows returned by the list endpoints.
pub const LIST_LIMIT: i64 = 15;

/// Query string of the list endpoints. Unknown orderings fall back to the
/// default order.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "orderedBy", alias = "ordered_by")]
    pub ordered_by: Option<String>,
}

impl ListQuery {
    pub fn order(&self) -> ListOrder {
        match self.ordered_by.as_deref() {
            Some("upload_date") => ListOrder::UploadDate,
            _ => ListOrder::Default,
        }
    }
}

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: u16,
    pub message: String,
    pub data: Option<DeleteReport>,
}

/// Turn a delete outcome into a response. A root row that was already gone
/// counts as success.
pub(crate) fn delete_outcome(
    entity: &str,
    id: &str,
    outcome: wf_core::Result<DeleteReport>,
) -> Result<Json<DeleteResponse>, AppError> {
    match outcome {
        Ok(report) => Ok(Json(DeleteResponse {
            status: 200,
            message: format!("Deleted {entity} {id}"),
            data: Some(report),
        })),
        Err(e) if e.is_already_gone() => {
            tracing::info!(entity, id, "Delete of an already removed {entity}");
            Ok(Json(DeleteResponse {
                status: 200,
                message: format!("{entity} {id} was already deleted"),
                data: None,
            }))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::{DeleteStage, Error};

    #[test]
    fn list_order_from_query() {
        let q = ListQuery {
            ordered_by: Some("upload_date".into()),
        };
        assert_eq!(q.order(), ListOrder::UploadDate);
        assert_eq!(ListQuery::default().order(), ListOrder::Default);
        let q = ListQuery {
            ordered_by: Some("rating".into()),
        };
        assert_eq!(q.order(), ListOrder::Default);
    }

    #[test]
    fn already_gone_is_success() {
        let gone = Error::cascade(
            DeleteStage::RemoveRoot,
            "abc",
            Error::not_found("show", "abc"),
        );
        let Json(body) = delete_outcome("show", "abc", Err(gone)).unwrap();
        assert_eq!(body.status, 200);
        assert!(body.data.is_none());
    }

    #[test]
    fn other_failures_propagate() {
        let failed = Error::cascade(
            DeleteStage::RemoveDependentBlobs,
            "abc",
            Error::Internal("disk".into()),
        );
        assert!(delete_outcome("show", "abc", Err(failed)).is_err());
    }
}
