//! Bulk import of category-organized product files.
//!
//! Source layout is `<data_dir>/<category>/<subcategory>/products.json`, each
//! file a JSON array of loosely shaped product objects. Buckets and records
//! are processed sequentially in lexicographic order, so error samples are
//! attributable and reproducible. Only failing to list the top-level
//! directory aborts a run; everything below that is recorded and skipped.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{BucketResult, CanonicalProduct, ImportSummary, SkippedBucket};
use crate::sanitize::sanitize;

/// File holding one bucket's records.
pub const PRODUCTS_FILE: &str = "products.json";

/// Reported per-record error strings are cut to this many characters.
pub const MAX_ERROR_LEN: usize = 300;

/// Message recorded for records failing the accept predicate.
pub const REJECTED_MESSAGE: &str = "Invalid product: missing name or brand";

const IGNORED_ENTRY: &str = ".DS_Store";
const PROGRESS_EVERY: usize = 100;
const BARCODE_SUFFIX_LEN: usize = 9;

/// Prefix of generated barcodes, by origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeOrigin {
    Import,
    TestImport,
    Manual,
}

impl BarcodeOrigin {
    fn prefix(&self) -> &'static str {
        match self {
            BarcodeOrigin::Import => "IMPORT",
            BarcodeOrigin::TestImport => "TEST",
            BarcodeOrigin::Manual => "MANUAL",
        }
    }
}

/// Generate a barcode of the form `<PREFIX>_<unix millis>_<9 chars [0-9a-z]>`.
///
/// Uniqueness is probabilistic only; existing barcodes are not consulted.
pub fn synthetic_barcode(origin: BarcodeOrigin) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let millis = chrono::Utc::now().timestamp_millis();
    let mut random = uuid::Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(BARCODE_SUFFIX_LEN);
    for _ in 0..BARCODE_SUFFIX_LEN {
        suffix.push(ALPHABET[(random % 36) as usize] as char);
        random /= 36;
    }
    format!("{}_{}_{}", origin.prefix(), millis, suffix)
}

/// Sanitize a raw record, attach its bucket and apply the accept predicate.
///
/// Returns the store-ready product, or `None` when `name` or `brand` is empty.
/// A blank barcode is replaced by a synthetic one.
pub fn prepare_record(
    raw: &Value,
    category: &str,
    subcategory: &str,
    origin: BarcodeOrigin,
) -> Option<CanonicalProduct> {
    let mut product = sanitize(raw);
    product.category = category.to_string();
    product.subcategory = subcategory.to_string();

    if !product.has_identity() {
        return None;
    }
    if !product.has_barcode() {
        product.barcode = synthetic_barcode(origin);
    }
    Some(product)
}

/// Runs imports against one repository and source tree.
#[derive(Clone)]
pub struct Importer {
    repo: Arc<Repository>,
    data_dir: PathBuf,
    error_sample: usize,
}

impl Importer {
    pub fn new(repo: Arc<Repository>, data_dir: PathBuf, error_sample: usize) -> Self {
        Self {
            repo,
            data_dir,
            error_sample,
        }
    }

    /// Import every bucket under the data directory.
    ///
    /// With `dry_run`, accepted records are counted as successes and never
    /// written.
    pub async fn import_all(&self, dry_run: bool) -> Result<ImportSummary, AppError> {
        let started = Instant::now();
        tracing::info!(
            "Starting {} import from {:?}",
            if dry_run { "dry-run" } else { "full" },
            self.data_dir
        );

        let categories = list_dirs(&self.data_dir).await.map_err(|e| {
            AppError::SourceRead(format!(
                "Cannot list source directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let mut summary = ImportSummary::new(dry_run);
        let mut progress = Progress::default();

        for category in categories {
            let category_dir = self.data_dir.join(&category);
            let subcategories = match list_dirs(&category_dir).await {
                Ok(subs) => subs,
                Err(e) => {
                    tracing::warn!("Skipping category {}: {}", category, e);
                    summary.skipped_buckets.push(SkippedBucket {
                        bucket: category.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for subcategory in subcategories {
                let key = bucket_key(&category, &subcategory);
                let records = match self.read_bucket(&category, &subcategory).await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!("Skipping bucket {}: {}", key, e.message());
                        summary.skipped_buckets.push(SkippedBucket {
                            bucket: key,
                            reason: e.message().to_string(),
                        });
                        continue;
                    }
                };

                tracing::info!("Processing {} ({} records)", key, records.len());
                let result = self
                    .process_bucket(
                        &category,
                        &subcategory,
                        &records,
                        dry_run,
                        BarcodeOrigin::Import,
                        &mut progress,
                    )
                    .await;
                summary.buckets.insert(key, result);
            }
        }

        summary.finalize();
        tracing::info!(
            "Import finished in {:?}: {} found, {} succeeded, {} failed ({}% success), {} buckets skipped",
            started.elapsed(),
            summary.total_found,
            summary.total_succeeded,
            summary.total_failed,
            summary.success_rate,
            summary.skipped_buckets.len()
        );
        Ok(summary)
    }

    /// Import the first `limit` records of one bucket, writing them.
    ///
    /// Both names must be single path components. A missing or unreadable
    /// bucket is an error here, since there is nothing else to run.
    pub async fn test_import(
        &self,
        category: &str,
        subcategory: &str,
        limit: usize,
    ) -> Result<ImportSummary, AppError> {
        validate_component(category)?;
        validate_component(subcategory)?;

        let records = self.read_bucket(category, subcategory).await?;
        let key = bucket_key(category, subcategory);
        tracing::info!(
            "Test import of {}: {} records found, importing up to {}",
            key,
            records.len(),
            limit
        );

        let sample = &records[..records.len().min(limit)];
        let mut progress = Progress::default();
        let result = self
            .process_bucket(
                category,
                subcategory,
                sample,
                false,
                BarcodeOrigin::TestImport,
                &mut progress,
            )
            .await;

        let mut summary = ImportSummary::new(false);
        summary.buckets.insert(key, result);
        summary.finalize();
        Ok(summary)
    }

    async fn read_bucket(&self, category: &str, subcategory: &str) -> Result<Vec<Value>, AppError> {
        let path = self
            .data_dir
            .join(category)
            .join(subcategory)
            .join(PRODUCTS_FILE);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::SourceRead(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        match serde_json::from_str::<Value>(content) {
            Ok(Value::Array(records)) => Ok(records),
            Ok(_) => Err(AppError::SourceRead(format!(
                "{} does not hold a JSON array",
                path.display()
            ))),
            Err(e) => Err(AppError::SourceRead(format!(
                "Cannot parse {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn process_bucket(
        &self,
        category: &str,
        subcategory: &str,
        records: &[Value],
        dry_run: bool,
        origin: BarcodeOrigin,
        progress: &mut Progress,
    ) -> BucketResult {
        let mut result = BucketResult {
            found: records.len(),
            ..Default::default()
        };

        for raw in records {
            progress.tick();

            let Some(product) = prepare_record(raw, category, subcategory, origin) else {
                tracing::warn!("{}/{}: {}", category, subcategory, REJECTED_MESSAGE);
                self.record_failure(&mut result, REJECTED_MESSAGE.to_string());
                continue;
            };

            if dry_run {
                result.success += 1;
                continue;
            }

            match self.repo.create_product(&product).await {
                Ok(_) => result.success += 1,
                Err(e) => {
                    let message = format!("{}: {}", product.name, e.message());
                    tracing::warn!("{}/{}: write failed for {}", category, subcategory, message);
                    self.record_failure(&mut result, message);
                }
            }
        }

        result
    }

    fn record_failure(&self, result: &mut BucketResult, message: String) {
        result.failed += 1;
        if result.errors.len() < self.error_sample {
            result.errors.push(truncate(message, MAX_ERROR_LEN));
        } else {
            result.omitted_errors += 1;
        }
    }
}

#[derive(Default)]
struct Progress {
    processed: usize,
}

impl Progress {
    fn tick(&mut self) {
        self.processed += 1;
        if self.processed % PROGRESS_EVERY == 0 {
            tracing::info!("Processed {} records", self.processed);
        }
    }
}

fn bucket_key(category: &str, subcategory: &str) -> String {
    format!("{}/{}", category, subcategory)
}

fn truncate(mut message: String, max_chars: usize) -> String {
    if let Some((idx, _)) = message.char_indices().nth(max_chars) {
        message.truncate(idx);
    }
    message
}

fn validate_component(name: &str) -> Result<(), AppError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Invalid bucket name: {:?}",
            name
        ))),
    }
}

/// Directory entries of `dir` that are themselves directories, sorted.
/// Symlinks are followed; `.DS_Store` and plain files are ignored.
async fn list_dirs(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == IGNORED_ENTRY {
            continue;
        }
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_dir() => names.push(name),
            Ok(_) => {}
            Err(e) => tracing::debug!("Ignoring unreadable entry {}: {}", name, e),
        }
    }

    names.sort();
    Ok(names)
}
