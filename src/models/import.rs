//! Bulk import request and report shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request body for a full import run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAllRequest {
    #[serde(default)]
    pub dry_run: bool,
}

/// Request body for a single-bucket smoke test.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestImportRequest {
    pub category: String,
    pub subcategory: String,
    #[serde(default = "default_test_limit")]
    pub limit: usize,
}

fn default_test_limit() -> usize {
    5
}

/// Outcome for one (category, subcategory) bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResult {
    pub found: usize,
    pub success: usize,
    pub failed: usize,
    /// First failures only; see `omitted_errors` for the remainder.
    pub errors: Vec<String>,
    pub omitted_errors: usize,
}

/// A bucket whose source could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedBucket {
    pub bucket: String,
    pub reason: String,
}

/// Aggregate report of an import run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub dry_run: bool,
    pub total_found: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
    /// Whole-number percentage of found records that succeeded.
    pub success_rate: u32,
    pub buckets: BTreeMap<String, BucketResult>,
    pub skipped_buckets: Vec<SkippedBucket>,
}

impl ImportSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Recompute the totals from the per-bucket counts.
    pub fn finalize(&mut self) {
        self.total_found = self.buckets.values().map(|b| b.found).sum();
        self.total_succeeded = self.buckets.values().map(|b| b.success).sum();
        self.total_failed = self.buckets.values().map(|b| b.failed).sum();
        self.success_rate = if self.total_found > 0 {
            ((self.total_succeeded as f64 / self.total_found as f64) * 100.0).round() as u32
        } else {
            0
        };
    }
}
