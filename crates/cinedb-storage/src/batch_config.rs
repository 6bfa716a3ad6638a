//! Configuration for batched inserts

use cinedb_core::config::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};

/// Batch insert configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Documents per unordered bulk insert
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }

        if self.batch_size > MAX_BATCH_SIZE {
            return Err(format!("batch_size too large (max: {})", MAX_BATCH_SIZE));
        }

        Ok(())
    }

    /// Number of batches needed for `total` documents.
    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_config_validation() {
        let mut config = BatchConfig::default();

        // Zero batch size
        config.batch_size = 0;
        assert!(config.validate().is_err());

        // Too large
        config.batch_size = MAX_BATCH_SIZE + 1;
        assert!(config.validate().is_err());

        // Valid
        config.batch_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_count() {
        let config = BatchConfig::new(1000);
        assert_eq!(config.batch_count(0), 0);
        assert_eq!(config.batch_count(1), 1);
        assert_eq!(config.batch_count(1000), 1);
        assert_eq!(config.batch_count(1001), 2);
        assert_eq!(config.batch_count(4999), 5);
    }
}
