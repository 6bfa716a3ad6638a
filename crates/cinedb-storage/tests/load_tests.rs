//! Loader and index manager behaviour against the in-memory store
//!
//! Covers:
//! 1. Batch splitting
//! 2. Per-document rejections inside an unordered batch
//! 3. Whole-batch failure mid-load
//! 4. Idempotent index creation
//! 5. Unique index over duplicated identities

use std::sync::Arc;

use cinedb_core::{normalize, CleanRecord, CoreError, RawRecord};
use cinedb_storage::{
    BatchConfig, BatchLoader, IndexManager, MemoryMovieStore, MovieStore,
};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("cinedb_storage=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn movie(id: i64, title: &str) -> CleanRecord {
    normalize(
        &RawRecord::new()
            .with("id", id.to_string())
            .with("title", title),
    )
}

fn movies(ids: impl IntoIterator<Item = i64>) -> Vec<CleanRecord> {
    ids.into_iter()
        .map(|id| movie(id, &format!("Movie {}", id)))
        .collect()
}

#[tokio::test]
async fn test_batches_are_sized_and_summed() {
    init_tracing();
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    let loader = BatchLoader::new(store.clone(), BatchConfig::new(1000)).unwrap();

    let records = movies(1..=2500);
    let report = loader.load(&records).await.unwrap();

    assert_eq!(store.insert_calls(), 3);
    assert_eq!(report.batches, 3);
    assert_eq!(report.attempted, 2500);
    assert_eq!(report.inserted, 2500);
    assert_eq!(report.failed, 0);
    assert_eq!(store.stats().await.unwrap().total_documents, 2500);
}

#[tokio::test]
async fn test_exact_multiple_of_batch_size() {
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    let loader = BatchLoader::new(store.clone(), BatchConfig::new(5)).unwrap();

    let report = loader.load(&movies(1..=10)).await.unwrap();

    assert_eq!(store.insert_calls(), 2);
    assert_eq!(report.inserted, 10);
}

#[tokio::test]
async fn test_rejected_document_does_not_stop_batch() {
    init_tracing();
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    IndexManager::new(store.clone()).ensure_indexes().await;
    store.seed([movie(42, "Already There")]);

    let loader = BatchLoader::new(store.clone(), BatchConfig::new(3)).unwrap();
    let records = movies([1, 42, 2, 3, 4]);
    let report = loader.load(&records).await.unwrap();

    assert_eq!(report.attempted, 5);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.failed, 1);

    let stored: Vec<i64> = store.documents().iter().map(|m| m.movie_id).collect();
    assert_eq!(stored, vec![42, 1, 2, 3, 4]);

    let original = store.find_by_movie_id(42).await.unwrap().unwrap();
    assert_eq!(original.title, "Already There");
}

#[tokio::test]
async fn test_duplicates_within_one_file_keep_first() {
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    IndexManager::new(store.clone()).ensure_indexes().await;

    let loader = BatchLoader::new(store.clone(), BatchConfig::new(2)).unwrap();
    let records = vec![movie(7, "First"), movie(8, "Other"), movie(7, "Second")];
    let report = loader.load(&records).await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 1);
    let kept = store.find_by_movie_id(7).await.unwrap().unwrap();
    assert_eq!(kept.title, "First");
}

#[tokio::test]
async fn test_batch_failure_aborts_and_keeps_earlier_batches() {
    init_tracing();
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    store.fail_inserts_after(2);

    let loader = BatchLoader::new(store.clone(), BatchConfig::new(10)).unwrap();
    let err = loader.load(&movies(1..=45)).await.unwrap_err();

    match err {
        CoreError::BulkInsert { batch, message } => {
            assert_eq!(batch, 3);
            assert!(message.contains("connection reset"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(store.insert_calls(), 3);
    assert_eq!(store.documents().len(), 20);
}

#[tokio::test]
async fn test_ensure_indexes_is_idempotent() {
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    let manager = IndexManager::new(store.clone());

    let first = manager.ensure_indexes().await;
    let before = store.stats().await.unwrap().indexes;
    let second = manager.ensure_indexes().await;
    let after = store.stats().await.unwrap().indexes;

    assert!(first.failed.is_empty());
    assert!(second.failed.is_empty());
    assert_eq!(first.created, second.created);
    assert_eq!(before, after);
    assert_eq!(after.len(), 10);
    assert_eq!(after[0], "_id_");
    assert!(after.contains(&"title_text_overview_text_tagline_text".to_string()));
}

#[tokio::test]
async fn test_unique_index_failure_does_not_block_others() {
    init_tracing();
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    store.seed([movie(0, "Unknown A"), movie(0, "Unknown B")]);

    let report = IndexManager::new(store.clone()).ensure_indexes().await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "movie_id_1");
    assert!(report.failed[0].1.contains("E11000"));
    assert_eq!(report.created.len(), 8);

    let indexes = store.stats().await.unwrap().indexes;
    assert!(!indexes.contains(&"movie_id_1".to_string()));
    assert!(indexes.contains(&"popularity_-1".to_string()));
}

#[tokio::test]
async fn test_clear_then_reload() {
    let store = Arc::new(MemoryMovieStore::new("movies_db", "movies"));
    store.seed(movies(100..110));

    assert_eq!(store.clear().await.unwrap(), 10);

    let loader = BatchLoader::new(store.clone(), BatchConfig::default()).unwrap();
    loader.load(&movies(1..=3)).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.database, "movies_db");
    assert_eq!(stats.collection, "movies");
}

#[tokio::test]
async fn test_closed_store_reports_not_connected() {
    let store = MemoryMovieStore::new("movies_db", "movies");
    store.close().await.unwrap();

    assert!(matches!(store.ping().await, Err(CoreError::NotConnected)));
    assert!(matches!(
        store.insert_unordered(&movies([1])).await,
        Err(CoreError::NotConnected)
    ));
    assert_eq!(store.close_calls(), 1);
}
