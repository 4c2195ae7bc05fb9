//! REST API module.
//!
//! Thin handlers over the repository, pagination engine, importer and
//! category registry. Every success is wrapped in [`ApiResponse`]; every
//! failure renders through [`AppError`].

mod categories;
mod import;
mod preferences;
mod products;

pub use categories::*;
pub use import::*;
pub use preferences::*;
pub use products::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError) -> ApiResult<T> {
    if err.status_code().is_server_error() {
        tracing::error!("Request failed: {}", err);
    }
    Err(err)
}
