//! Aggregate execution operator.
//!
//! Rows are partitioned by key, every aggregation expression is evaluated once
//! per group against that group's rows, and the per-group results are gathered
//! in group order.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use common_config::GroupOrdering;
use common_error::{QuiverError, QuiverResult};
use common_runtime::{install, map_ordered};
use log::debug;
use quiver_core::{Batch, Column, DataType, RowKey, Value};
use quiver_logical::{expand_selection, Expr};

use crate::executor::{EvalContext, RandomSource};
use crate::expr::{validate_parameters, ExprEvaluator};
use crate::operators::Operator;

/// Row indices of every group, in output order.
#[derive(Debug, Clone, Default)]
pub struct GroupPartition {
    /// Key of each group.
    pub keys: Vec<RowKey>,
    /// Row indices of each group, ascending.
    pub indices: Vec<Vec<u32>>,
}

impl GroupPartition {
    /// Partition `height` rows by the values of `key_columns`.
    ///
    /// `Stable` orders groups by first appearance. `Unordered` orders them by
    /// key hash, which is deterministic but unrelated to row order. Without key
    /// columns all rows form one group.
    pub fn build(
        key_columns: &[Column],
        height: usize,
        ordering: GroupOrdering,
    ) -> QuiverResult<Self> {
        let to_u32 = |row: usize| {
            u32::try_from(row).map_err(|_| QuiverError::compute("row index exceeds UInt32 range"))
        };
        if key_columns.is_empty() {
            let rows = (0..height).map(to_u32).collect::<QuiverResult<Vec<_>>>()?;
            return Ok(Self {
                keys: vec![RowKey(Vec::new())],
                indices: vec![rows],
            });
        }

        let mut slots: HashMap<RowKey, usize> = HashMap::new();
        let mut partition = Self::default();
        for (row, key) in RowKey::rows(key_columns)?.into_iter().enumerate() {
            let row = to_u32(row)?;
            match slots.entry(key) {
                Entry::Occupied(slot) => partition.indices[*slot.get()].push(row),
                Entry::Vacant(slot) => {
                    partition.keys.push(slot.key().clone());
                    partition.indices.push(vec![row]);
                    slot.insert(partition.keys.len() - 1);
                }
            }
        }
        if ordering == GroupOrdering::Unordered {
            partition.sort_by_hash();
        }
        Ok(partition)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First row of every group.
    pub fn first_rows(&self) -> Vec<u32> {
        self.indices.iter().filter_map(|rows| rows.first().copied()).collect()
    }

    fn sort_by_hash(&mut self) {
        let hash = |key: &RowKey| {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            hasher.finish()
        };
        let mut groups: Vec<(u64, RowKey, Vec<u32>)> = self
            .keys
            .drain(..)
            .zip(self.indices.drain(..))
            .map(|(key, rows)| (hash(&key), key, rows))
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for (_, key, rows) in groups {
            self.keys.push(key);
            self.indices.push(rows);
        }
    }
}

/// Hash aggregate operator.
///
/// Output columns are the key columns (one row per group) followed by one
/// column per aggregation. Aggregations that reduce to a single value are
/// flattened; any other expression produces one list cell per group.
#[derive(Debug, Clone)]
pub struct HashAggregateExec {
    keys: Vec<Expr>,
    aggs: Vec<Expr>,
    ordering: GroupOrdering,
}

impl HashAggregateExec {
    /// Create a hash aggregate operator.
    pub fn new(keys: Vec<Expr>, aggs: Vec<Expr>, ordering: GroupOrdering) -> Self {
        Self {
            keys,
            aggs,
            ordering,
        }
    }

    /// Group ordering of the output.
    pub fn ordering(&self) -> GroupOrdering {
        self.ordering
    }

    fn key_columns(&self, keys: &[Expr], ctx: &EvalContext<'_>) -> QuiverResult<Vec<Column>> {
        let evaluator = ExprEvaluator::new();
        keys.iter()
            .map(|e| evaluator.evaluate(e, ctx)?.broadcast(ctx.height()))
            .collect()
    }
}

impl Operator for HashAggregateExec {
    fn name(&self) -> &'static str {
        "HashAggregateExec"
    }

    fn execute(&self, ctx: &EvalContext<'_>) -> QuiverResult<Batch> {
        let batch = ctx.batch();
        let schema = batch.schema();
        let keys = expand_selection(&self.keys, &schema)?;
        let aggs = expand_selection(&self.aggs, &schema)?;
        keys.iter().chain(&aggs).try_for_each(validate_parameters)?;

        let key_columns = self.key_columns(&keys, ctx)?;
        let partition = GroupPartition::build(&key_columns, batch.height(), self.ordering)?;
        let parallel = ctx.config().parallel;
        debug!(
            "HashAggregateExec: {} rows into {} groups (ordering={:?}, parallel={parallel})",
            batch.height(),
            partition.len(),
            self.ordering
        );

        // One draw from the shared source; group `i` derives its own from it.
        let base_seed = if aggs.iter().any(Expr::draws_random) {
            Some(ctx.random().seed_for(None)?)
        } else {
            None
        };

        let evaluator = ExprEvaluator::new();
        let groups: Vec<(usize, &Vec<u32>)> = partition.indices.iter().enumerate().collect();
        let per_group: Vec<Vec<Column>> = install(ctx.pool(), || {
            map_ordered(&groups, parallel, |&(i, rows)| {
                let group = batch.take(rows)?;
                let random = base_seed.map(|base| RandomSource::derived(base, i));
                let group_ctx = match &random {
                    Some(random) => ctx.rebind(&group).with_random(random),
                    None => ctx.rebind(&group),
                };
                aggs.iter()
                    .map(|e| evaluator.evaluate(e, &group_ctx))
                    .collect::<QuiverResult<Vec<_>>>()
            })
        })?;

        let first_rows = partition.first_rows();
        let mut columns = key_columns
            .iter()
            .map(|c| c.take(&first_rows))
            .collect::<QuiverResult<Vec<_>>>()?;

        // Dtype and name of each aggregation when there are no groups.
        let empty_results = if per_group.is_empty() {
            let empty = batch.slice(0, 0);
            let empty_ctx = ctx.rebind(&empty);
            Some(
                aggs.iter()
                    .map(|e| evaluator.evaluate(e, &empty_ctx))
                    .collect::<QuiverResult<Vec<_>>>()?,
            )
        } else {
            None
        };

        for (i, expr) in aggs.iter().enumerate() {
            let results: Vec<&Column> = per_group.iter().map(|g| &g[i]).collect();
            let template = match (&empty_results, results.first()) {
                (_, Some(first)) => (*first).clone(),
                (Some(empty), None) => empty[i].clone(),
                (None, None) => {
                    return Err(QuiverError::internal(
                        "aggregation without groups or empty-input results",
                    ))
                }
            };
            columns.push(gather(expr, template, &results)?);
        }
        Batch::new(columns)
    }
}

/// Assemble one output column from the per-group results of `expr`.
fn gather(expr: &Expr, template: Column, results: &[&Column]) -> QuiverResult<Column> {
    let name = template.name().to_string();
    let mut dtype = template.dtype().clone();
    for column in results {
        dtype = dtype.supertype(column.dtype()).ok_or_else(|| {
            QuiverError::dtype_mismatch(format!(
                "groups of '{name}' produced incompatible dtypes {dtype} and {}",
                column.dtype()
            ))
        })?;
    }

    if expr.returns_scalar() {
        let values = results
            .iter()
            .map(|c| match c.len() {
                1 => c.get(0),
                len => Err(QuiverError::length_mismatch(
                    format!("aggregation '{name}'"),
                    1,
                    len,
                )),
            })
            .collect::<QuiverResult<Vec<Value>>>()?;
        if dtype == DataType::Null {
            return Ok(Column::full_null(name, dtype, values.len()));
        }
        return Column::from_typed_values(name, dtype, &values);
    }

    let cells = results
        .iter()
        .map(|c| Ok(Value::list(dtype.clone(), c.cast(&dtype)?.to_values()?)))
        .collect::<QuiverResult<Vec<_>>>()?;
    Column::from_typed_values(name, DataType::List(Box::new(dtype)), &cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::ExecutionConfig;
    use quiver_logical::expr::{col, count};

    use crate::executor::RandomSource;

    fn batch() -> Batch {
        Batch::new(vec![
            Column::from_iter_values("k", ["a", "b", "a", "a", "b"]).unwrap(),
            Column::from_iter_values("v", [1i64, 2, 3, 4, 5]).unwrap(),
        ])
        .unwrap()
    }

    fn run(op: &HashAggregateExec, batch: &Batch, parallel: bool) -> Batch {
        let config = ExecutionConfig::default().with_parallel(parallel);
        let random = RandomSource::new(Some(0));
        op.execute(&EvalContext::new(batch, &config, &random)).unwrap()
    }

    #[test]
    fn test_stable_partition() {
        let keys = Column::from_iter_values("k", ["b", "a", "b", "c"]).unwrap();
        let partition = GroupPartition::build(&[keys], 4, GroupOrdering::Stable).unwrap();
        assert_eq!(partition.indices, vec![vec![0, 2], vec![1], vec![3]]);
        assert_eq!(partition.first_rows(), vec![0, 1, 3]);
    }

    #[test]
    fn test_unordered_partition_is_deterministic() {
        let keys = Column::from_iter_values("k", [5i64, 1, 5, 9, 1, 7]).unwrap();
        let a = GroupPartition::build(&[keys.clone()], 6, GroupOrdering::Unordered).unwrap();
        let b = GroupPartition::build(&[keys], 6, GroupOrdering::Unordered).unwrap();
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_no_keys_is_one_group() {
        let partition = GroupPartition::build(&[], 3, GroupOrdering::Stable).unwrap();
        assert_eq!(partition.indices, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_scalar_and_list_outputs() {
        let op = HashAggregateExec::new(
            vec![col("k")],
            vec![col("v").sum().alias("sum"), col("v").alias("all"), count()],
            GroupOrdering::Stable,
        );
        let out = run(&op, &batch(), false);
        assert_eq!(out.column_names(), vec!["k", "sum", "all", "count"]);
        assert_eq!(
            out.column("sum").unwrap().to_values().unwrap(),
            vec![Value::Int64(8), Value::Int64(7)]
        );
        assert_eq!(
            out.column("all").unwrap().get(1).unwrap(),
            Value::list(DataType::Int64, vec![Value::Int64(2), Value::Int64(5)])
        );
        assert_eq!(
            out.column("count").unwrap().to_values().unwrap(),
            vec![Value::UInt32(3), Value::UInt32(2)]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let op = HashAggregateExec::new(
            vec![col("k")],
            vec![col("v").mean(), col("v").cumcount(false).alias("cc")],
            GroupOrdering::Stable,
        );
        let seq = run(&op, &batch(), false);
        let par = run(&op, &batch(), true);
        for name in ["k", "v", "cc"] {
            assert_eq!(
                seq.column(name).unwrap().to_values().unwrap(),
                par.column(name).unwrap().to_values().unwrap()
            );
        }
    }

    #[test]
    fn test_empty_input_keeps_dtypes() {
        let empty = batch().slice(0, 0);
        let op = HashAggregateExec::new(
            vec![col("k")],
            vec![col("v").sum(), col("v").alias("vals")],
            GroupOrdering::Stable,
        );
        let out = run(&op, &empty, false);
        assert_eq!(out.height(), 0);
        assert_eq!(*out.column("v").unwrap().dtype(), DataType::Int64);
        assert_eq!(
            *out.column("vals").unwrap().dtype(),
            DataType::List(Box::new(DataType::Int64))
        );
    }
}
