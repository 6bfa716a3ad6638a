//! Batched, unordered loading of normalized movies

use std::sync::Arc;

use cinedb_core::{CleanRecord, CoreError};
use tracing::{error, info, warn};

use crate::backend::MovieStore;
use crate::batch_config::BatchConfig;
use crate::error::Result;

/// Progress after one batch has been acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based batch number
    pub batch: usize,
    pub total_batches: usize,
    /// Documents written by this batch
    pub batch_inserted: usize,
    /// Documents rejected by this batch
    pub batch_failed: usize,
    /// Documents written so far
    pub inserted: usize,
    /// Documents in the whole load
    pub total: usize,
}

/// Totals for a completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub batches: usize,
    pub attempted: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Splits records into fixed-size batches and submits them one at a time.
///
/// Batches are unordered: a rejected document never stops the rest of its
/// batch. A batch that fails as a whole aborts the load, leaving earlier
/// batches persisted.
pub struct BatchLoader {
    store: Arc<dyn MovieStore>,
    config: BatchConfig,
}

impl BatchLoader {
    /// Create new batch loader
    pub fn new(store: Arc<dyn MovieStore>, config: BatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CoreError::Validation(format!("Invalid batch config: {}", e)))?;

        Ok(Self { store, config })
    }

    /// Load every record, returning the totals.
    pub async fn load(&self, records: &[CleanRecord]) -> Result<LoadReport> {
        self.load_with_progress(records, |_| {}).await
    }

    /// Load every record, invoking `on_batch` after each acknowledged batch.
    pub async fn load_with_progress<F>(
        &self,
        records: &[CleanRecord],
        mut on_batch: F,
    ) -> Result<LoadReport>
    where
        F: FnMut(&BatchProgress),
    {
        let total = records.len();
        let total_batches = self.config.batch_count(total);
        let mut report = LoadReport::default();

        for (i, chunk) in records.chunks(self.config.batch_size).enumerate() {
            let batch = i + 1;

            let outcome = match self.store.insert_unordered(chunk).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        batch = batch,
                        inserted = report.inserted,
                        "Batch insert failed: {}",
                        e
                    );
                    return Err(match e {
                        CoreError::BulkInsert { .. } | CoreError::NotConnected => e,
                        other => CoreError::bulk_insert(batch, other.to_string()),
                    });
                }
            };

            for failure in &outcome.failures {
                warn!(
                    batch = batch,
                    position = failure.index,
                    code = failure.code,
                    "Document rejected: {}",
                    failure.message
                );
            }

            report.batches += 1;
            report.attempted += outcome.attempted;
            report.inserted += outcome.inserted;
            report.failed += outcome.failures.len();

            info!(
                batch = batch,
                total_batches = total_batches,
                inserted = outcome.inserted,
                "Inserted {} movies. Total: {}/{}",
                outcome.inserted,
                report.inserted,
                total
            );

            on_batch(&BatchProgress {
                batch,
                total_batches,
                batch_inserted: outcome.inserted,
                batch_failed: outcome.failures.len(),
                inserted: report.inserted,
                total,
            });
        }

        Ok(report)
    }
}
