//! Paging request and result shapes shared by the product and preference engines.

use serde::Serialize;

/// Options for one page fetch.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub page_size: Option<usize>,
    pub cursor: Option<String>,
    pub search_term: Option<String>,
    /// Exact-match filter: brand for products, type for preferences.
    pub filter: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T: Serialize> {
    pub items: Vec<T>,
    /// Token for the following page; `None` once the sequence is exhausted.
    pub next_cursor: Option<String>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}
