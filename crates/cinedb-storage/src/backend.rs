use async_trait::async_trait;

use cinedb_core::CleanRecord;

use crate::error::Result;

/// Sort order (or text mode) of one indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDirection {
    Ascending,
    Descending,
    Text,
}

impl IndexDirection {
    /// Suffix used in generated index names (`title_1`, `title_text`).
    #[must_use]
    pub fn name_suffix(self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
            Self::Text => "text",
        }
    }
}

/// Declarative description of one collection index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Indexed fields in key order.
    pub keys: Vec<(&'static str, IndexDirection)>,

    /// Reject documents repeating the key.
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field index.
    #[must_use]
    pub fn single(field: &'static str, direction: IndexDirection) -> Self {
        Self {
            keys: vec![(field, direction)],
            unique: false,
        }
    }

    /// Multi-field index.
    #[must_use]
    pub fn compound(keys: Vec<(&'static str, IndexDirection)>) -> Self {
        Self {
            keys,
            unique: false,
        }
    }

    /// Marks the index unique (builder pattern).
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Server-style generated name, e.g. `vote_average_-1_vote_count_-1`.
    #[must_use]
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, direction)| format!("{}_{}", field, direction.name_suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// A document rejected inside an otherwise successful unordered insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Position within the submitted batch.
    pub index: usize,

    /// Server error code (11000 for duplicate keys).
    pub code: i32,

    pub message: String,
}

/// Outcome of one unordered bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Documents submitted.
    pub attempted: usize,

    /// Documents actually written.
    pub inserted: usize,

    /// Per-document rejections; never aborts the rest of the batch.
    pub failures: Vec<DocumentFailure>,
}

impl InsertOutcome {
    /// Every document in the batch was written.
    #[must_use]
    pub fn complete(count: usize) -> Self {
        Self {
            attempted: count,
            inserted: count,
            failures: Vec::new(),
        }
    }
}

/// Summary of the target collection after an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total_documents: u64,
    pub database: String,
    pub collection: String,
    /// Index names, including the implicit `_id_` index.
    pub indexes: Vec<String>,
}

/// Abstraction over the movie collection (MongoDB in production, memory in
/// tests).
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Round-trip to the server.
    async fn ping(&self) -> Result<()>;

    /// Insert a batch without stopping at the first rejected document.
    ///
    /// Per-document failures are reported in the outcome; an `Err` means the
    /// batch as a whole could not be submitted.
    async fn insert_unordered(&self, batch: &[CleanRecord]) -> Result<InsertOutcome>;

    /// Delete every document in the collection, returning how many went.
    async fn clear(&self) -> Result<u64>;

    /// Create an index if it does not exist yet; returns the index name.
    async fn create_index(&self, spec: &IndexSpec) -> Result<String>;

    /// Document count and index list.
    async fn stats(&self) -> Result<CollectionStats>;

    /// Look up a stored movie by its source identity.
    async fn find_by_movie_id(&self, movie_id: i64) -> Result<Option<CleanRecord>>;

    /// Release the connection. Called exactly once per run.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_names() {
        assert_eq!(
            IndexSpec::single("movie_id", IndexDirection::Ascending)
                .unique()
                .name(),
            "movie_id_1"
        );
        assert_eq!(
            IndexSpec::compound(vec![
                ("vote_average", IndexDirection::Descending),
                ("vote_count", IndexDirection::Descending),
            ])
            .name(),
            "vote_average_-1_vote_count_-1"
        );
        assert_eq!(
            IndexSpec::compound(vec![
                ("title", IndexDirection::Text),
                ("overview", IndexDirection::Text),
            ])
            .name(),
            "title_text_overview_text"
        );
    }
}
