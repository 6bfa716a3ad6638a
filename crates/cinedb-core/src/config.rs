//! Loader configuration
//!
//! Settings are read once at startup and handed to the importer by value:
//! - `.env` file in the working directory (merged into the process
//!   environment, never overriding variables that are already set)
//! - `MONGO_*` environment variables
//! - Hardcoded defaults (lowest priority)

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Default database name.
pub const DEFAULT_DATABASE: &str = "movies_db";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "movies";

/// Default number of documents per bulk insert.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Upper bound accepted for `MONGO_BATCH_SIZE`.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Environment variable holding the connection string.
pub const CONNECTION_STRING_KEY: &str = "MONGO_CONNECTION_STRING";

/// Immutable settings for one import run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// MongoDB connection string (`mongodb://` or `mongodb+srv://`).
    pub connection_string: String,

    /// Target database.
    pub database: String,

    /// Target collection.
    pub collection: String,

    /// Documents per bulk insert.
    pub batch_size: usize,
}

#[derive(Debug, Deserialize)]
struct EnvSettings {
    connection_string: Option<String>,
    database: String,
    collection: String,
    batch_size: usize,
}

impl ImportConfig {
    /// Load configuration from `.env` and the process environment.
    ///
    /// Fails with [`CoreError::ConfigMissing`] when no connection string is
    /// configured.
    pub fn load() -> CoreResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }

        Self::from_env_source(None)
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment. Keys carry the `MONGO_` prefix.
    pub fn from_vars(vars: config::Map<String, String>) -> CoreResult<Self> {
        Self::from_env_source(Some(vars))
    }

    fn from_env_source(source: Option<config::Map<String, String>>) -> CoreResult<Self> {
        let settings: EnvSettings = Config::builder()
            .set_default("database", DEFAULT_DATABASE)?
            .set_default("collection", DEFAULT_COLLECTION)?
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .add_source(
                Environment::with_prefix("MONGO")
                    .try_parsing(true)
                    .source(source),
            )
            .build()?
            .try_deserialize()?;

        let connection_string = settings
            .connection_string
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::ConfigMissing {
                key: CONNECTION_STRING_KEY,
            })?;

        let config = Self {
            connection_string,
            database: settings.database,
            collection: settings.collection,
            batch_size: settings.batch_size,
        };
        config.validate()?;

        Ok(config)
    }

    /// Returns a copy with a different batch size, validated.
    pub fn with_batch_size(mut self, batch_size: usize) -> CoreResult<Self> {
        self.batch_size = batch_size;
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> CoreResult<()> {
        if self.database.trim().is_empty() {
            return Err(CoreError::Validation(
                "database name must not be empty".to_string(),
            ));
        }

        if self.collection.trim().is_empty() {
            return Err(CoreError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(CoreError::Validation(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        let mut map = config::Map::new();
        for (k, v) in pairs {
            map.insert((*k).to_string(), (*v).to_string());
        }
        map
    }

    #[test]
    fn test_defaults_applied() {
        let config = ImportConfig::from_vars(vars(&[(
            "MONGO_CONNECTION_STRING",
            "mongodb://localhost:27017",
        )]))
        .unwrap();

        assert_eq!(config.connection_string, "mongodb://localhost:27017");
        assert_eq!(config.database, "movies_db");
        assert_eq!(config.collection, "movies");
        assert_eq!(config.batch_size, 1000);
    }

    #[test]
    fn test_overrides() {
        let config = ImportConfig::from_vars(vars(&[
            ("MONGO_CONNECTION_STRING", "mongodb://db:27017"),
            ("MONGO_DATABASE", "films"),
            ("MONGO_COLLECTION", "catalogue"),
            ("MONGO_BATCH_SIZE", "250"),
        ]))
        .unwrap();

        assert_eq!(config.database, "films");
        assert_eq!(config.collection, "catalogue");
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn test_missing_connection_string() {
        let err = ImportConfig::from_vars(vars(&[("MONGO_DATABASE", "films")])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConfigMissing {
                key: "MONGO_CONNECTION_STRING"
            }
        ));
    }

    #[test]
    fn test_blank_connection_string_counts_as_missing() {
        let err =
            ImportConfig::from_vars(vars(&[("MONGO_CONNECTION_STRING", "   ")])).unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissing { .. }));
    }

    #[test]
    fn test_batch_size_validation() {
        let config = ImportConfig::from_vars(vars(&[(
            "MONGO_CONNECTION_STRING",
            "mongodb://localhost",
        )]))
        .unwrap();

        assert!(config.clone().with_batch_size(0).is_err());
        assert!(config.clone().with_batch_size(MAX_BATCH_SIZE + 1).is_err());
        assert_eq!(config.with_batch_size(10).unwrap().batch_size, 10);
    }
}
