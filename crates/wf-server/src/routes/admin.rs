//! Operator endpoints.

use axum::extract::State;
use axum::Json;

use crate::audit::{audit, AuditReport};
use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/v1/admin/audit
pub async fn storage_audit(State(ctx): State<AppContext>) -> Result<Json<AuditReport>, AppError> {
    Ok(Json(audit(ctx.store.as_ref(), &ctx.layout).await?))
}
