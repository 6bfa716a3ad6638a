//! Persistence for normalized movies: the store abstraction, its MongoDB
//! and in-memory implementations, batched loading and index management.

pub mod backend;
pub mod batch_config;
pub mod batch_loader;
pub mod error;
pub mod indexes;
pub mod memory;
pub mod mongo;

pub use backend::{
    CollectionStats, DocumentFailure, IndexDirection, IndexSpec, InsertOutcome, MovieStore,
};
pub use batch_config::BatchConfig;
pub use batch_loader::{BatchLoader, BatchProgress, LoadReport};
pub use error::Result;
pub use indexes::{movie_indexes, IndexManager, IndexReport};
pub use memory::MemoryMovieStore;
pub use mongo::{MongoMovieStore, MovieDocument};
