use thiserror::Error;

/// Canonical error type for loader operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required configuration key is absent or blank.
    #[error("required configuration `{key}` is not set")]
    ConfigMissing {
        /// Environment variable name the value is read from.
        key: &'static str,
    },

    /// Configuration could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(String),

    /// A whole batch failed to reach the store (connectivity, auth, ...).
    ///
    /// Documents from earlier batches stay persisted.
    #[error("bulk insert of batch {batch} failed: {message}")]
    BulkInsert {
        /// 1-based batch number.
        batch: usize,
        /// Driver error text.
        message: String,
    },

    /// An index could not be created.
    #[error("failed to create index `{index}`: {message}")]
    IndexCreation {
        /// Index name.
        index: String,
        /// Driver error text.
        message: String,
    },

    /// A store operation was attempted before a connection was established.
    #[error("no open connection to the document store")]
    NotConnected,

    /// Any other store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation error for input data or settings.
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Creates a `BulkInsert` variant.
    #[must_use]
    pub fn bulk_insert(batch: usize, message: impl Into<String>) -> Self {
        Self::BulkInsert {
            batch,
            message: message.into(),
        }
    }

    /// Creates an `IndexCreation` variant.
    #[must_use]
    pub fn index_creation(index: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexCreation {
            index: index.into(),
            message: message.into(),
        }
    }

    /// Creates a `Storage` variant.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
