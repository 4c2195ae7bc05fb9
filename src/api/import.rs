//! Import API endpoints.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::models::{ImportAllRequest, ImportSummary, TestImportRequest};
use crate::AppState;

/// POST /api/import/all - Import every bucket of the source tree.
///
/// The body is optional; without one the run is live.
pub async fn import_all(
    State(state): State<AppState>,
    request: Option<Json<ImportAllRequest>>,
) -> ApiResult<ImportSummary> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    match state.importer.import_all(request.dry_run).await {
        Ok(summary) => success(summary),
        Err(e) => error(e),
    }
}

/// POST /api/import/test - Import the first records of one bucket.
pub async fn test_import(
    State(state): State<AppState>,
    Json(request): Json<TestImportRequest>,
) -> ApiResult<ImportSummary> {
    match state
        .importer
        .test_import(&request.category, &request.subcategory, request.limit)
        .await
    {
        Ok(summary) => success(summary),
        Err(e) => error(e),
    }
}
