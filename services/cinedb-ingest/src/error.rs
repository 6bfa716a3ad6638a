use std::path::PathBuf;

use cinedb_core::CoreError;

/// Fatal errors surfaced by the ingest binary.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read CSV file {}: {source}", path.display())]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read input: {0}")]
    Prompt(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
