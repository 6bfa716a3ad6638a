use async_trait::async_trait;
use chrono::Utc;
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use cinedb_core::{normalize_all, CoreError, CoreResult, ImportConfig};
use cinedb_storage::{
    BatchConfig, BatchLoader, CollectionStats, IndexManager, IndexReport, LoadReport,
    MongoMovieStore, MovieStore,
};

use crate::csv_reader::MovieCsvReader;
use crate::error::IngestError;
use crate::prompt::InputProvider;

/// Opens the store an import runs against.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &ImportConfig) -> CoreResult<Arc<dyn MovieStore>>;
}

/// Connects to the MongoDB deployment named by the configuration.
pub struct MongoConnector;

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self, config: &ImportConfig) -> CoreResult<Arc<dyn MovieStore>> {
        Ok(Arc::new(MongoMovieStore::connect(config).await?))
    }
}

/// Position of an import run. Runs only move forward and always end in
/// `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Disconnected,
    Connected,
    Read,
    Normalized,
    Cleared,
    Loaded,
    Indexed,
    Reported,
    Closed,
}

/// What one import run did.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub zero_ids: usize,
    pub duplicate_ids: usize,
    /// Documents deleted before loading, when the operator asked for it.
    pub cleared: Option<u64>,
    pub load: LoadReport,
    pub indexes: IndexReport,
    pub stats: CollectionStats,
    pub duration_secs: f64,
}

impl ImportSummary {
    pub fn print(&self) {
        println!("\n✅ Import complete!");
        println!("  Rows read: {}", self.rows_read);
        if self.zero_ids > 0 || self.duplicate_ids > 0 {
            println!(
                "  ⚠️  Rows without an id: {}, repeated ids: {}",
                self.zero_ids, self.duplicate_ids
            );
        }
        if let Some(removed) = self.cleared {
            println!("  Documents cleared: {}", removed);
        }
        println!("  Movies inserted: {}", self.load.inserted);
        if self.load.failed > 0 {
            println!("  Movies rejected: {}", self.load.failed);
        }
        println!("  Batches: {}", self.load.batches);
        println!("  Time elapsed: {:.2}s", self.duration_secs);
        println!("\n📊 Collection statistics");
        println!("  Database: {}", self.stats.database);
        println!("  Collection: {}", self.stats.collection);
        println!("  Total documents: {}", self.stats.total_documents);
        println!("  Indexes: {}", self.stats.indexes.join(", "));
        if !self.indexes.failed.is_empty() {
            println!("  ⚠️  Indexes not created:");
            for (name, reason) in &self.indexes.failed {
                println!("    - {}: {}", name, reason);
            }
        }
    }
}

/// Sequences one import: connect, read, normalize, optionally clear, load,
/// index, report. The store is closed exactly once whatever happens.
pub struct Importer<C, P> {
    config: ImportConfig,
    connector: C,
    input: P,
    pb: ProgressBar,
    store: Option<Arc<dyn MovieStore>>,
    stages: Vec<ImportStage>,
}

impl<C: StoreConnector, P: InputProvider> Importer<C, P> {
    pub fn new(config: ImportConfig, connector: C, input: P) -> Self {
        Self {
            config,
            connector,
            input,
            pb: ProgressBar::hidden(),
            store: None,
            stages: vec![ImportStage::Disconnected],
        }
    }

    /// Report progress on `pb` (builder pattern).
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// Current stage.
    pub fn stage(&self) -> ImportStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(ImportStage::Disconnected)
    }

    /// Every stage visited so far, in order.
    pub fn stages(&self) -> &[ImportStage] {
        &self.stages
    }

    /// The open store, or `NotConnected` outside a run.
    pub fn store(&self) -> CoreResult<Arc<dyn MovieStore>> {
        self.store.clone().ok_or(CoreError::NotConnected)
    }

    /// Import `csv_path`.
    pub async fn run(&mut self, csv_path: &Path) -> Result<ImportSummary, IngestError> {
        let result = self.run_stages(csv_path).await;
        self.disconnect().await;

        match &result {
            Ok(summary) => self.pb.finish_with_message(format!(
                "✅ Imported {} movies in {:.2}s",
                summary.load.inserted, summary.duration_secs
            )),
            Err(_) => self.pb.abandon_with_message("❌ Import aborted"),
        }

        result
    }

    async fn run_stages(&mut self, csv_path: &Path) -> Result<ImportSummary, IngestError> {
        let start_time = Instant::now();

        self.pb.set_message("Connecting to MongoDB...");
        self.store = Some(self.connector.connect(&self.config).await?);
        self.advance(ImportStage::Connected);

        self.pb
            .set_message(format!("Reading {}...", csv_path.display()));
        let raws = MovieCsvReader::new(csv_path).read()?;
        self.advance(ImportStage::Read);

        self.pb
            .set_message(format!("Normalizing {} rows...", raws.len()));
        let normalized = normalize_all(&raws, Utc::now());
        if normalized.zero_ids > 0 {
            warn!(
                count = normalized.zero_ids,
                "Rows without a usable id were given movie_id 0; only the first can be stored"
            );
        }
        if normalized.duplicate_ids > 0 {
            warn!(
                count = normalized.duplicate_ids,
                "Rows repeat a movie_id already seen in this file and will be rejected"
            );
        }
        self.advance(ImportStage::Normalized);

        let store = self.store()?;
        let collection = self.config.collection.clone();
        let input = &mut self.input;
        let clear = self.pb.suspend(|| input.confirm_clear(&collection))?;
        let cleared = if clear {
            let removed = store.clear().await?;
            info!(removed = removed, collection = %collection, "Collection cleared");
            self.advance(ImportStage::Cleared);
            Some(removed)
        } else {
            None
        };

        let loader = BatchLoader::new(store.clone(), BatchConfig::new(self.config.batch_size))?;
        let pb = &self.pb;
        let load = loader
            .load_with_progress(&normalized.records, |p| {
                pb.set_message(format!(
                    "Batch {}/{}: {}/{} movies inserted",
                    p.batch, p.total_batches, p.inserted, p.total
                ))
            })
            .await?;
        self.advance(ImportStage::Loaded);

        self.pb.set_message("Creating indexes...");
        let indexes = IndexManager::new(store.clone()).ensure_indexes().await;
        self.advance(ImportStage::Indexed);

        let stats = match store.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Could not read collection statistics: {}", e);
                CollectionStats {
                    database: self.config.database.clone(),
                    collection: self.config.collection.clone(),
                    ..Default::default()
                }
            }
        };
        self.advance(ImportStage::Reported);

        Ok(ImportSummary {
            rows_read: raws.len(),
            zero_ids: normalized.zero_ids,
            duplicate_ids: normalized.duplicate_ids,
            cleared,
            load,
            indexes,
            stats,
            duration_secs: start_time.elapsed().as_secs_f64(),
        })
    }

    async fn disconnect(&mut self) {
        if let Some(store) = self.store.take() {
            if let Err(e) = store.close().await {
                warn!("Failed to close store: {}", e);
            }
        }
        self.advance(ImportStage::Closed);
        debug!(stages = ?self.stages(), "Import finished");
    }

    fn advance(&mut self, stage: ImportStage) {
        debug!(from = ?self.stage(), to = ?stage, "Import stage");
        self.stages.push(stage);
    }
}
