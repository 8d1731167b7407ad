//! Store configuration

use cellar_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sizing options for a [`SharedStore`](crate::SharedStore)
///
/// Every field has a default, so a config file only needs to name what it
/// overrides:
///
/// ```
/// use cellar_storage::StoreConfig;
///
/// let config: StoreConfig = serde_json::from_str(r#"{"shard_amount": 8}"#).unwrap();
/// assert_eq!(config.shard_amount, Some(8));
/// assert_eq!(config.initial_capacity, 0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of cells to pre-allocate
    pub initial_capacity: usize,
    /// Number of DashMap shards; `None` uses the DashMap default
    pub shard_amount: Option<usize>,
}

impl StoreConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pre-allocated capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the shard count
    pub fn shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = Some(shards);
        self
    }

    /// Check the configuration before building a store
    ///
    /// The shard count must be a power of two greater than one.
    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(Error::Config(format!(
                    "shard_amount must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        Ok(())
    }
}
