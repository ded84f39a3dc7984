//! Configuration management for Quiver.
//!
//! Provides the execution knobs consulted by the evaluator and the groupby executor.

use common_error::{QuiverError, QuiverResult};
use serde::{Deserialize, Serialize};

/// Global Quiver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuiverConfig {
    /// Execution configuration.
    pub execution: ExecutionConfig,
}

impl QuiverConfig {
    /// Parse a configuration from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> QuiverResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.execution.validate()?;
        Ok(config)
    }

    /// Serialize this configuration as pretty-printed JSON.
    pub fn to_json(&self) -> QuiverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Execution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Evaluate independent groups / list cells on worker threads.
    pub parallel: bool,
    /// Number of worker threads. `None` uses the rayon default.
    pub num_threads: Option<usize>,
    /// Group ordering used when a caller does not pick one.
    pub default_ordering: GroupOrdering,
    /// Seed for the shared random source. `None` seeds from OS entropy.
    pub default_seed: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            num_threads: None,
            default_ordering: GroupOrdering::Stable,
            default_seed: None,
        }
    }
}

impl ExecutionConfig {
    /// Enable or disable data-parallel evaluation.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the default group ordering.
    #[must_use]
    pub fn with_default_ordering(mut self, ordering: GroupOrdering) -> Self {
        self.default_ordering = ordering;
        self
    }

    /// Set the seed of the shared random source.
    #[must_use]
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Check that the configured values are usable.
    pub fn validate(&self) -> QuiverResult<()> {
        if self.num_threads == Some(0) {
            return Err(QuiverError::invalid_parameter(
                "num_threads must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Output ordering of groups in a groupby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupOrdering {
    /// Groups appear in first-encountered order.
    #[default]
    Stable,
    /// Groups appear in a consistent hash-bucket order.
    Unordered,
}

impl std::fmt::Display for GroupOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Unordered => write!(f, "unordered"),
        }
    }
}
