//! Local single-node executor implementation.

use std::sync::Arc;
use std::time::Instant;

use common_config::{ExecutionConfig, GroupOrdering, QuiverConfig};
use common_error::QuiverResult;
use common_runtime::{build_thread_pool, ThreadPool};
use log::debug;
use quiver_core::{Batch, Column};
use quiver_logical::Expr;

use crate::executor::{EvalContext, RandomSource};
use crate::expr::evaluate;
use crate::operators::{FilterExec, HashAggregateExec, Operator, ProjectExec};

/// Local single-node executor.
///
/// Owns the execution config, the shared random source and, in parallel mode,
/// the worker pool. Every call evaluates against one batch and returns a new
/// batch; inputs are never modified.
#[derive(Debug)]
pub struct LocalExecutor {
    config: ExecutionConfig,
    random: RandomSource,
    pool: Option<Arc<ThreadPool>>,
}

impl LocalExecutor {
    /// Create an executor. The worker pool is built only in parallel mode.
    pub fn new(config: ExecutionConfig) -> QuiverResult<Self> {
        config.validate()?;
        let pool = if config.parallel {
            Some(Arc::new(build_thread_pool(&config)?))
        } else {
            None
        };
        Ok(Self {
            random: RandomSource::new(config.default_seed),
            config,
            pool,
        })
    }

    /// Create from a full configuration.
    pub fn from_config(config: &QuiverConfig) -> QuiverResult<Self> {
        Self::new(config.execution.clone())
    }

    /// Get the executor configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Reset the shared random source used by unseeded `sample`/`shuffle`.
    pub fn reseed(&self, seed: u64) -> QuiverResult<()> {
        self.random.reseed(seed)
    }

    /// Evaluate a single expression against `batch`.
    pub fn evaluate(&self, expr: &Expr, batch: &Batch) -> QuiverResult<Column> {
        evaluate(expr, &self.context(batch))
    }

    /// Evaluate `exprs` and output only their results.
    pub fn select(&self, batch: &Batch, exprs: Vec<Expr>) -> QuiverResult<Batch> {
        self.run(&ProjectExec::select(exprs), batch)
    }

    /// Evaluate `exprs` and add or replace them on `batch`.
    pub fn with_columns(&self, batch: &Batch, exprs: Vec<Expr>) -> QuiverResult<Batch> {
        self.run(&ProjectExec::with_columns(exprs), batch)
    }

    /// Keep the rows of `batch` where `predicate` is true.
    pub fn filter(&self, batch: &Batch, predicate: Expr) -> QuiverResult<Batch> {
        self.run(&FilterExec::new(predicate), batch)
    }

    /// Group by `keys` with the configured default ordering.
    pub fn group_by(&self, batch: &Batch, keys: Vec<Expr>, aggs: Vec<Expr>) -> QuiverResult<Batch> {
        self.groupby_aggregate(batch, keys, aggs, self.config.default_ordering)
    }

    /// Group by `keys` and evaluate `aggs` once per group.
    pub fn groupby_aggregate(
        &self,
        batch: &Batch,
        keys: Vec<Expr>,
        aggs: Vec<Expr>,
        ordering: GroupOrdering,
    ) -> QuiverResult<Batch> {
        self.run(&HashAggregateExec::new(keys, aggs, ordering), batch)
    }

    fn context<'a>(&'a self, batch: &'a Batch) -> EvalContext<'a> {
        EvalContext::new(batch, &self.config, &self.random).with_pool(self.pool.as_deref())
    }

    fn run(&self, op: &dyn Operator, batch: &Batch) -> QuiverResult<Batch> {
        let start = Instant::now();
        let out = op.execute(&self.context(batch))?;
        debug!(
            "{} finished in {:?}: {}x{} -> {}x{}",
            op.name(),
            start.elapsed(),
            batch.height(),
            batch.width(),
            out.height(),
            out.width()
        );
        Ok(out)
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self {
            config: ExecutionConfig::default(),
            random: RandomSource::default(),
            pool: None,
        }
    }
}
