//! In-memory movie store for testing

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use cinedb_core::{CleanRecord, CoreError};

use crate::backend::{CollectionStats, DocumentFailure, IndexSpec, InsertOutcome, MovieStore};
use crate::error::Result;

/// Server error code for unique key violations.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Default)]
struct MemoryState {
    documents: Vec<CleanRecord>,
    /// Created indexes, in creation order.
    indexes: Vec<(String, IndexSpec)>,
    insert_calls: usize,
    /// Inserts allowed before the store starts failing whole batches.
    fail_after_inserts: Option<usize>,
    /// Error returned by `stats` instead of the statistics.
    stats_failure: Option<String>,
    close_calls: usize,
}

/// In-memory movie store (for testing)
///
/// Mirrors the server behaviour the loader depends on: unordered inserts,
/// unique indexes, idempotent index creation.
#[derive(Clone)]
pub struct MemoryMovieStore {
    database: String,
    collection: String,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryMovieStore {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Make every insert after the first `successful` calls fail as a batch.
    pub fn fail_inserts_after(&self, successful: usize) {
        self.state.write().fail_after_inserts = Some(successful);
    }

    /// Make every `stats` call fail with `message`.
    pub fn fail_stats(&self, message: impl Into<String>) {
        self.state.write().stats_failure = Some(message.into());
    }

    /// Number of `insert_unordered` calls received.
    pub fn insert_calls(&self) -> usize {
        self.state.read().insert_calls
    }

    /// Number of `close` calls received.
    pub fn close_calls(&self) -> usize {
        self.state.read().close_calls
    }

    /// Snapshot of the stored documents.
    pub fn documents(&self) -> Vec<CleanRecord> {
        self.state.read().documents.clone()
    }

    /// Insert documents directly, bypassing batch accounting.
    pub fn seed(&self, records: impl IntoIterator<Item = CleanRecord>) {
        self.state.write().documents.extend(records);
    }

    fn ensure_open(state: &MemoryState) -> Result<()> {
        if state.close_calls > 0 {
            return Err(CoreError::NotConnected);
        }
        Ok(())
    }
}

/// Rendered values of the indexed fields, used to detect unique key
/// collisions.
fn key_of(record: &CleanRecord, spec: &IndexSpec) -> Result<String> {
    let value = serde_json::to_value(record).map_err(|e| CoreError::storage(e.to_string()))?;
    let fields: Vec<String> = spec
        .keys
        .iter()
        .map(|(field, _)| {
            let v = value.get(*field).cloned().unwrap_or(Value::Null);
            format!("{}: {}", field, v)
        })
        .collect();
    Ok(fields.join(", "))
}

fn duplicate_key_message(collection: &str, index: &str, key: &str) -> String {
    format!(
        "E11000 duplicate key error collection: {} index: {} dup key: {{ {} }}",
        collection, index, key
    )
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn ping(&self) -> Result<()> {
        Self::ensure_open(&self.state.read())
    }

    async fn insert_unordered(&self, batch: &[CleanRecord]) -> Result<InsertOutcome> {
        let mut state = self.state.write();
        Self::ensure_open(&state)?;

        state.insert_calls += 1;
        if let Some(limit) = state.fail_after_inserts {
            if state.insert_calls > limit {
                return Err(CoreError::storage("connection reset by peer"));
            }
        }

        let mut unique: Vec<(String, IndexSpec, HashSet<String>)> = Vec::new();
        for (name, spec) in state.indexes.iter().filter(|(_, spec)| spec.unique) {
            let taken = state
                .documents
                .iter()
                .map(|d| key_of(d, spec))
                .collect::<Result<HashSet<_>>>()?;
            unique.push((name.clone(), spec.clone(), taken));
        }

        let mut outcome = InsertOutcome {
            attempted: batch.len(),
            ..Default::default()
        };

        'documents: for (index, record) in batch.iter().enumerate() {
            let mut keys = Vec::with_capacity(unique.len());
            for (name, spec, taken) in &unique {
                let key = key_of(record, spec)?;
                if taken.contains(&key) {
                    outcome.failures.push(DocumentFailure {
                        index,
                        code: DUPLICATE_KEY_CODE,
                        message: duplicate_key_message(&self.collection, name, &key),
                    });
                    continue 'documents;
                }
                keys.push(key);
            }
            for ((_, _, taken), key) in unique.iter_mut().zip(keys) {
                taken.insert(key);
            }
            state.documents.push(record.clone());
            outcome.inserted += 1;
        }

        Ok(outcome)
    }

    async fn clear(&self) -> Result<u64> {
        let mut state = self.state.write();
        Self::ensure_open(&state)?;
        let removed = state.documents.len() as u64;
        state.documents.clear();
        Ok(removed)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<String> {
        let mut state = self.state.write();
        Self::ensure_open(&state)?;
        let name = spec.name();

        if let Some((_, existing)) = state.indexes.iter().find(|(n, _)| *n == name) {
            if existing == spec {
                return Ok(name);
            }
            return Err(CoreError::index_creation(
                name,
                "an index with the same name but different options already exists",
            ));
        }

        if spec.unique {
            let mut seen = HashSet::with_capacity(state.documents.len());
            for record in &state.documents {
                let key = key_of(record, spec)?;
                if seen.contains(&key) {
                    let message = duplicate_key_message(&self.collection, &name, &key);
                    return Err(CoreError::index_creation(name, message));
                }
                seen.insert(key);
            }
        }

        state.indexes.push((name.clone(), spec.clone()));
        Ok(name)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let state = self.state.read();
        Self::ensure_open(&state)?;
        if let Some(message) = &state.stats_failure {
            return Err(CoreError::storage(message.clone()));
        }

        let mut indexes = vec!["_id_".to_string()];
        indexes.extend(state.indexes.iter().map(|(name, _)| name.clone()));

        Ok(CollectionStats {
            total_documents: state.documents.len() as u64,
            database: self.database.clone(),
            collection: self.collection.clone(),
            indexes,
        })
    }

    async fn find_by_movie_id(&self, movie_id: i64) -> Result<Option<CleanRecord>> {
        let state = self.state.read();
        Self::ensure_open(&state)?;
        Ok(state
            .documents
            .iter()
            .find(|m| m.movie_id == movie_id)
            .cloned())
    }

    async fn close(&self) -> Result<()> {
        self.state.write().close_calls += 1;
        Ok(())
    }
}
