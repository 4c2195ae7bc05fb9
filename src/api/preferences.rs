//! Preference API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{PageOptions, PaginatedResult, Preference, PreferenceRecord};
use crate::pagination::fetch_preferences_page;
use crate::AppState;

/// Preference list query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceListQuery {
    pub page_size: Option<usize>,
    pub cursor: Option<String>,
    pub search: Option<String>,
    /// Exact type filter.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/preferences - One page of preferences.
pub async fn list_preferences(
    State(state): State<AppState>,
    Query(query): Query<PreferenceListQuery>,
) -> ApiResult<PaginatedResult<Preference>> {
    let options = PageOptions {
        page_size: query.page_size,
        cursor: query.cursor,
        search_term: query.search,
        filter: query.kind,
    };
    match fetch_preferences_page(&state.repo, &options, state.config.page_size).await {
        Ok(page) => success(page),
        Err(e) => error(e),
    }
}

/// GET /api/preferences/:id - Get a single preference.
pub async fn get_preference(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Preference> {
    match state.repo.get::<Preference>(&id).await {
        Ok(Some(preference)) => success(preference),
        Ok(None) => error(AppError::NotFound(format!("Preference {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/preferences - Create a preference.
pub async fn create_preference(
    State(state): State<AppState>,
    Json(request): Json<PreferenceRecord>,
) -> ApiResult<Preference> {
    match state.repo.create_preference(&request).await {
        Ok(preference) => success(preference),
        Err(e) => error(e),
    }
}

/// PUT /api/preferences/:id - Replace a preference.
pub async fn update_preference(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PreferenceRecord>,
) -> ApiResult<Preference> {
    match state.repo.update_preference(&id, &request).await {
        Ok(preference) => success(preference),
        Err(e) => error(e),
    }
}

/// DELETE /api/preferences/:id - Delete a preference.
pub async fn delete_preference(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    match state.repo.delete::<Preference>(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
