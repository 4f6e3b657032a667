// Aggregation configuration

use serde::{Deserialize, Serialize};

use crate::error::AggregationError;
use crate::types::AggregationStrategy;

/// Tunables for one aggregation call.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use att_agg::{AggregationConfig, AggregationStrategy};
///
/// let config = AggregationConfig::from_json(r#"{ "max_rounds": 16 }"#).unwrap();
/// assert_eq!(config.strategy, AggregationStrategy::MaxCover);
/// assert_eq!(config.max_rounds, Some(16));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Packing strategy
    pub strategy: AggregationStrategy,
    /// Maximum number of greedy selections (the `k` of Max-k-Cover).
    /// `None` runs until no candidate adds coverage.
    pub max_rounds: Option<usize>,
}

impl AggregationConfig {
    pub const fn new(strategy: AggregationStrategy) -> Self {
        Self {
            strategy,
            max_rounds: None,
        }
    }

    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Parses a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, AggregationError> {
        serde_json::from_str(json).map_err(|e| AggregationError::ConfigError {
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, AggregationError> {
        serde_json::to_string_pretty(self).map_err(|e| AggregationError::ConfigError {
            message: e.to_string(),
        })
    }
}
