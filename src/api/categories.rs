//! Category API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::models::{CategoryInput, CategoryNode, CategorySummary};
use crate::AppState;

/// GET /api/categories - List persisted taxonomy nodes.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryNode>> {
    match state.categories.list().await {
        Ok(nodes) => success(nodes),
        Err(e) => error(e),
    }
}

/// GET /api/categories/overview - Persisted nodes merged with product-derived categories.
pub async fn category_overview(State(state): State<AppState>) -> ApiResult<Vec<CategorySummary>> {
    match state.categories.overview().await {
        Ok(summaries) => success(summaries),
        Err(e) => error(e),
    }
}

/// POST /api/categories - Create a node.
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryInput>,
) -> ApiResult<CategoryNode> {
    match state.categories.add(&request).await {
        Ok(node) => success(node),
        Err(e) => error(e),
    }
}

/// PUT /api/categories/:id - Replace a node.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CategoryInput>,
) -> ApiResult<CategoryNode> {
    match state.categories.update(&id, &request).await {
        Ok(node) => success(node),
        Err(e) => error(e),
    }
}

/// DELETE /api/categories/:id - Delete a node.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    match state.categories.delete(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
