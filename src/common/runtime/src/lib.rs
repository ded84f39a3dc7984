//! Worker pool utilities for Quiver.
//!
//! Evaluation is CPU-bound and synchronous. The optional data-parallel mode runs
//! independent sub-evaluations on a rayon pool and gathers the results in input
//! order once every task has finished.

use common_config::ExecutionConfig;
use common_error::{QuiverError, QuiverResult};
use log::debug;
use rayon::prelude::*;

pub use rayon::ThreadPool;

/// Build a worker pool sized by the execution config.
pub fn build_thread_pool(config: &ExecutionConfig) -> QuiverResult<ThreadPool> {
    config.validate()?;
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("quiver-worker-{i}"));
    if let Some(n) = config.num_threads {
        builder = builder.num_threads(n);
    }
    let pool = builder
        .build()
        .map_err(|e| QuiverError::internal(format!("Failed to build worker pool: {e}")))?;
    debug!("built worker pool with {} threads", pool.current_num_threads());
    Ok(pool)
}

/// Map `f` over `items`, optionally in parallel, returning results in input order.
///
/// The first error (in input order) is returned; results of other tasks are dropped.
pub fn map_ordered<T, R, F>(items: &[T], parallel: bool, f: F) -> QuiverResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> QuiverResult<R> + Sync + Send,
{
    if parallel && items.len() > 1 {
        // Indexed collect keeps input order; this is the single-writer gather.
        let results: Vec<QuiverResult<R>> = items.par_iter().map(&f).collect();
        results.into_iter().collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// Run `op` inside `pool` when one is given, otherwise on the calling thread
/// (or rayon's global pool for nested parallel work).
pub fn install<R, OP>(pool: Option<&ThreadPool>, op: OP) -> R
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
