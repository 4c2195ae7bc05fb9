//! Cursor-based page fetching over a store collection.
//!
//! Two modes share one entry point:
//!
//! - **Indexed**: no search or filter. Reads `page_size + 1` documents in
//!   `(name, id)` order after the cursor; the extra document only signals
//!   that another page exists. `total` comes from a count query and is only
//!   computed when the sequence starts.
//! - **Scan and filter**: the store has no text index, so the whole ordered
//!   collection is loaded and matched in process. `total` is the number of
//!   matches. Cost grows with the collection, not the page.
//!
//! Callers cannot tell the modes apart; a text index can replace the scan
//! without changing [`fetch_page`].

mod cursor;

pub use cursor::{decode_cursor, encode_cursor, Scope};

use serde::Serialize;

use crate::db::{Keyed, Repository, SortKey, StoredEntity};
use crate::errors::AppError;
use crate::models::{PageOptions, PaginatedResult, Preference, Product};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Entities the engine can search and filter.
pub trait Searchable: StoredEntity + Serialize {
    /// `needle` is already lower-cased.
    fn matches_search(&self, needle: &str) -> bool;

    /// Exact match on the entity's filter field.
    fn matches_filter(&self, filter: &str) -> bool;
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for Product {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.record.name, needle)
            || contains_ci(&self.record.brand, needle)
            || contains_ci(&self.record.barcode, needle)
    }

    fn matches_filter(&self, filter: &str) -> bool {
        self.record.brand == filter
    }
}

impl Searchable for Preference {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.record.name, needle) || contains_ci(&self.record.type_id, needle)
    }

    fn matches_filter(&self, filter: &str) -> bool {
        self.record.kind == filter
    }
}

/// Fetch one page of products. `filter` is an exact brand.
pub async fn fetch_products_page(
    repo: &Repository,
    options: &PageOptions,
    default_page_size: usize,
) -> Result<PaginatedResult<Product>, AppError> {
    fetch_page(repo, options, default_page_size).await
}

/// Fetch one page of preferences. `filter` is an exact type.
pub async fn fetch_preferences_page(
    repo: &Repository,
    options: &PageOptions,
    default_page_size: usize,
) -> Result<PaginatedResult<Preference>, AppError> {
    fetch_page(repo, options, default_page_size).await
}

/// Fetch one page of `T`.
///
/// A cursor that does not decode, or that was issued under different search
/// or filter terms, restarts the sequence at page one. Store failures
/// propagate as [`AppError::Fetch`].
pub async fn fetch_page<T: Searchable>(
    repo: &Repository,
    options: &PageOptions,
    default_page_size: usize,
) -> Result<PaginatedResult<T>, AppError> {
    let page_size = options
        .page_size
        .unwrap_or(default_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    let scope = Scope::new(options.search_term.as_deref(), options.filter.as_deref());
    let after = options
        .cursor
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .and_then(|c| decode_cursor(c, &scope));

    if scope.is_unfiltered() {
        fetch_indexed(repo, page_size, after, &scope).await
    } else {
        fetch_filtered(repo, page_size, after, &scope).await
    }
}

async fn fetch_indexed<T: Searchable>(
    repo: &Repository,
    page_size: usize,
    after: Option<SortKey>,
    scope: &Scope,
) -> Result<PaginatedResult<T>, AppError> {
    let rows = repo.page_after::<T>(after.as_ref(), page_size + 1).await?;

    let total = if after.is_none() {
        match repo.count::<T>().await {
            Ok(total) => Some(total),
            Err(e) => {
                tracing::warn!("Count query failed, returning page without total: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(into_page(rows, page_size, scope, total))
}

async fn fetch_filtered<T: Searchable>(
    repo: &Repository,
    page_size: usize,
    after: Option<SortKey>,
    scope: &Scope,
) -> Result<PaginatedResult<T>, AppError> {
    let needle = scope.search.as_deref().map(str::to_lowercase);
    let filter = scope.filter.as_deref();

    let matched: Vec<Keyed<T>> = repo
        .scan::<T>()
        .await?
        .into_iter()
        .filter(|row| needle.as_deref().map_or(true, |n| row.item.matches_search(n)))
        .filter(|row| filter.map_or(true, |f| row.item.matches_filter(f)))
        .collect();

    let total = matched.len();
    let start = after.map_or(0, |key| matched.partition_point(|row| row.key <= key));
    tracing::debug!(
        "Filtered scan matched {} items, resuming at {}",
        total,
        start
    );

    let rows: Vec<Keyed<T>> = matched.into_iter().skip(start).take(page_size + 1).collect();
    Ok(into_page(rows, page_size, scope, Some(total)))
}

/// Trim a `page_size + 1` window to a page and derive its cursor.
fn into_page<T: Searchable>(
    mut rows: Vec<Keyed<T>>,
    page_size: usize,
    scope: &Scope,
    total: Option<usize>,
) -> PaginatedResult<T> {
    let has_more = rows.len() > page_size;
    rows.truncate(page_size);

    let next_cursor = if has_more {
        rows.last().map(|row| encode_cursor(&row.key, scope))
    } else {
        None
    };

    PaginatedResult {
        items: rows.into_iter().map(|row| row.item).collect(),
        next_cursor,
        has_more,
        total,
    }
}
