//! Product API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::import::{synthetic_barcode, BarcodeOrigin};
use crate::models::{CanonicalProduct, PageOptions, PaginatedResult, Product};
use crate::pagination::fetch_products_page;
use crate::sanitize::sanitize;
use crate::AppState;

/// Product list query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub page_size: Option<usize>,
    pub cursor: Option<String>,
    pub search: Option<String>,
    /// Exact brand filter.
    pub brand: Option<String>,
}

impl From<ProductListQuery> for PageOptions {
    fn from(query: ProductListQuery) -> Self {
        PageOptions {
            page_size: query.page_size,
            cursor: query.cursor,
            search_term: query.search,
            filter: query.brand,
        }
    }
}

/// Sanitize a submitted product and check its required fields.
fn validated(raw: &Value) -> Result<CanonicalProduct, AppError> {
    if !raw.is_object() {
        return Err(AppError::Validation(
            "Product must be a JSON object".to_string(),
        ));
    }
    let product = sanitize(raw);
    if product.name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if product.brand.trim().is_empty() {
        return Err(AppError::Validation("Product brand is required".to_string()));
    }
    Ok(product)
}

/// POST /api/products/sanitize - Normalize a raw record without storing it.
pub async fn sanitize_product(Json(raw): Json<Value>) -> ApiResult<CanonicalProduct> {
    success(sanitize(&raw))
}

/// GET /api/products - One page of products.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResult<Product>> {
    let options = PageOptions::from(query);
    match fetch_products_page(&state.repo, &options, state.config.page_size).await {
        Ok(page) => success(page),
        Err(e) => error(e),
    }
}

/// GET /api/products/brands - Distinct brands for filter menus.
pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    match state.repo.distinct_brands().await {
        Ok(brands) => success(brands),
        Err(e) => error(e),
    }
}

/// GET /api/products/:id - Get a single product.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    match state.repo.get::<Product>(&id).await {
        Ok(Some(product)) => success(product),
        Ok(None) => error(AppError::NotFound(format!("Product {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/products - Create a product from a raw record.
pub async fn create_product(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> ApiResult<Product> {
    let mut product = match validated(&raw) {
        Ok(product) => product,
        Err(e) => return error(e),
    };
    if !product.has_barcode() {
        product.barcode = synthetic_barcode(BarcodeOrigin::Manual);
    }

    match state.repo.create_product(&product).await {
        Ok(product) => {
            tracing::info!("Created product {} ({})", product.record.name, product.id);
            success(product)
        }
        Err(e) => error(e),
    }
}

/// PUT /api/products/:id - Replace a product.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(raw): Json<Value>,
) -> ApiResult<Product> {
    let product = match validated(&raw) {
        Ok(product) => product,
        Err(e) => return error(e),
    };

    match state.repo.update_product(&id, &product).await {
        Ok(product) => success(product),
        Err(e) => error(e),
    }
}

/// DELETE /api/products/:id - Delete a product.
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    match state.repo.delete::<Product>(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
