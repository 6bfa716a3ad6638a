//! Index catalog for the movie collection

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{IndexDirection, IndexSpec, MovieStore};

/// Indexes created after every import, in creation order.
pub fn movie_indexes() -> Vec<IndexSpec> {
    use IndexDirection::{Ascending, Descending, Text};

    vec![
        IndexSpec::single("movie_id", Ascending).unique(),
        IndexSpec::single("title", Ascending),
        IndexSpec::single("release_date", Descending),
        IndexSpec::single("vote_average", Descending),
        IndexSpec::single("popularity", Descending),
        IndexSpec::single("original_language", Ascending),
        IndexSpec::compound(vec![("vote_average", Descending), ("vote_count", Descending)]),
        IndexSpec::compound(vec![("release_date", Descending), ("popularity", Descending)]),
        IndexSpec::compound(vec![
            ("title", Text),
            ("overview", Text),
            ("tagline", Text),
        ]),
    ]
}

/// Outcome of [`IndexManager::ensure_indexes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Indexes that exist after the call.
    pub created: Vec<String>,
    /// Index name and failure reason.
    pub failed: Vec<(String, String)>,
}

/// Issues the idempotent index set against a store.
pub struct IndexManager {
    store: Arc<dyn MovieStore>,
    specs: Vec<IndexSpec>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self::with_specs(store, movie_indexes())
    }

    pub fn with_specs(store: Arc<dyn MovieStore>, specs: Vec<IndexSpec>) -> Self {
        Self { store, specs }
    }

    /// Create every index in order. A failing index is logged and skipped.
    pub async fn ensure_indexes(&self) -> IndexReport {
        info!(count = self.specs.len(), "Creating indexes");
        let mut report = IndexReport::default();

        for spec in &self.specs {
            match self.store.create_index(spec).await {
                Ok(name) => report.created.push(name),
                Err(e) => {
                    let name = spec.name();
                    warn!(index = %name, "Index creation failed: {}", e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        if report.failed.is_empty() {
            info!(created = report.created.len(), "Indexes created");
        } else {
            warn!(
                created = report.created.len(),
                failed = report.failed.len(),
                "Some indexes could not be created"
            );
        }

        report
    }
}
