//! Evaluation context.
//!
//! The context binds column names to data for one evaluation. It is read-only:
//! nested evaluations (per group, per list cell) rebind it to a derived batch and
//! share everything else.

use common_config::ExecutionConfig;
use common_runtime::ThreadPool;
use quiver_core::Batch;

use super::RandomSource;

/// Name of the column holding the current list cell inside `list_eval`.
pub const ELEMENT_COLUMN: &str = "";

/// Everything an expression can read while it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    batch: &'a Batch,
    config: &'a ExecutionConfig,
    random: &'a RandomSource,
    pool: Option<&'a ThreadPool>,
    in_list_eval: bool,
}

impl<'a> EvalContext<'a> {
    /// Create a context over `batch`.
    pub fn new(batch: &'a Batch, config: &'a ExecutionConfig, random: &'a RandomSource) -> Self {
        Self {
            batch,
            config,
            random,
            pool: None,
            in_list_eval: false,
        }
    }

    /// Run data-parallel work inside `pool` instead of rayon's global pool.
    #[must_use]
    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    /// The bound batch.
    pub fn batch(&self) -> &'a Batch {
        self.batch
    }

    /// Number of rows in the bound batch.
    pub fn height(&self) -> usize {
        self.batch.height()
    }

    /// Active execution configuration.
    pub fn config(&self) -> &'a ExecutionConfig {
        self.config
    }

    /// Shared random source.
    pub fn random(&self) -> &'a RandomSource {
        self.random
    }

    /// Worker pool for parallel sections, if one was configured.
    pub fn pool(&self) -> Option<&'a ThreadPool> {
        self.pool
    }

    /// Whether `element()` is bound.
    pub fn in_list_eval(&self) -> bool {
        self.in_list_eval
    }

    /// Same context over another batch (one group's rows).
    pub(crate) fn rebind<'b>(&self, batch: &'b Batch) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            batch,
            config: self.config,
            random: self.random,
            pool: self.pool,
            in_list_eval: self.in_list_eval,
        }
    }

    /// Same context drawing unseeded randomness from `random`.
    pub(crate) fn with_random<'b>(&self, random: &'b RandomSource) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            batch: self.batch,
            config: self.config,
            random,
            pool: self.pool,
            in_list_eval: self.in_list_eval,
        }
    }

    /// Context for one list cell; `batch` holds the cell as [`ELEMENT_COLUMN`].
    pub(crate) fn for_list_cell<'b>(&self, batch: &'b Batch) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            in_list_eval: true,
            ..self.rebind(batch)
        }
    }
}
