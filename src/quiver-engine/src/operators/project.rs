//! Project execution operator.

use common_error::{QuiverError, QuiverResult};
use log::debug;
use quiver_core::{Batch, Column};
use quiver_logical::{expand_selection, Expr};

use crate::executor::EvalContext;
use crate::expr::kernels::broadcast_all;
use crate::expr::{validate_parameters, ExprEvaluator};
use crate::operators::Operator;

/// How projected columns relate to the input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectMode {
    /// Output only the projected columns.
    Select,
    /// Replace or append projected columns on the input batch.
    WithColumns,
}

/// Project execution operator.
///
/// Expands selectors against the input schema, evaluates every expression
/// against the input batch, and broadcasts single-row results.
#[derive(Debug, Clone)]
pub struct ProjectExec {
    exprs: Vec<Expr>,
    mode: ProjectMode,
}

impl ProjectExec {
    /// Output exactly the evaluated expressions.
    pub fn select(exprs: Vec<Expr>) -> Self {
        Self {
            exprs,
            mode: ProjectMode::Select,
        }
    }

    /// Keep the input columns, replacing those with the same name.
    pub fn with_columns(exprs: Vec<Expr>) -> Self {
        Self {
            exprs,
            mode: ProjectMode::WithColumns,
        }
    }

    /// Projection expressions as given.
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    fn evaluate_all(&self, ctx: &EvalContext<'_>) -> QuiverResult<Vec<Column>> {
        let exprs = expand_selection(&self.exprs, &ctx.batch().schema())?;
        exprs.iter().try_for_each(validate_parameters)?;
        let evaluator = ExprEvaluator::new();
        exprs.iter().map(|e| evaluator.evaluate(e, ctx)).collect()
    }
}

impl Operator for ProjectExec {
    fn name(&self) -> &'static str {
        match self.mode {
            ProjectMode::Select => "ProjectExec",
            ProjectMode::WithColumns => "WithColumnsExec",
        }
    }

    fn execute(&self, ctx: &EvalContext<'_>) -> QuiverResult<Batch> {
        let outputs = self.evaluate_all(ctx)?;
        debug!("{} produced {} columns", self.name(), outputs.len());
        match self.mode {
            ProjectMode::Select => Batch::new(broadcast_all(outputs, "select")?),
            ProjectMode::WithColumns => {
                let height = ctx.height();
                let mut columns = ctx.batch().columns().to_vec();
                for output in outputs {
                    let output = match output.len() {
                        len if len == height => output,
                        1 => output.broadcast(height)?,
                        len => {
                            return Err(QuiverError::length_mismatch(
                                format!("with_columns '{}'", output.name()),
                                height,
                                len,
                            ))
                        }
                    };
                    match columns.iter().position(|c| c.name() == output.name()) {
                        Some(i) => columns[i] = output,
                        None => columns.push(output),
                    }
                }
                Batch::new(columns)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::ExecutionConfig;
    use quiver_core::Value;
    use quiver_logical::expr::{all, col, lit};

    use crate::executor::RandomSource;

    fn run(op: &ProjectExec, batch: &Batch) -> QuiverResult<Batch> {
        let config = ExecutionConfig::default();
        let random = RandomSource::new(Some(0));
        op.execute(&EvalContext::new(batch, &config, &random))
    }

    fn batch() -> Batch {
        Batch::new(vec![
            Column::from_iter_values("a", [1i64, 2, 3]).unwrap(),
            Column::from_iter_values("b", [4i64, 5, 6]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_broadcasts_scalars() {
        let op = ProjectExec::select(vec![col("a"), col("b").sum().alias("total")]);
        let out = run(&op, &batch()).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(
            out.column("total").unwrap().to_values().unwrap(),
            vec![Value::Int64(15); 3]
        );
    }

    #[test]
    fn test_select_only_scalars_is_single_row() {
        let op = ProjectExec::select(vec![col("a").max(), col("b").min()]);
        let out = run(&op, &batch()).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_select_duplicate_names_rejected() {
        let op = ProjectExec::select(vec![col("a"), col("b").alias("a")]);
        assert!(run(&op, &batch()).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_with_columns_replaces_and_appends() {
        let op = ProjectExec::with_columns(vec![
            col("a") * lit(10i64),
            all().prefix("p_"),
        ]);
        let out = run(&op, &batch()).unwrap();
        assert_eq!(out.column_names(), vec!["a", "b", "p_a", "p_b"]);
        assert_eq!(out.column("a").unwrap().get(2).unwrap(), Value::Int64(30));
        // Expressions read the input batch, not earlier outputs.
        assert_eq!(out.column("p_a").unwrap().get(2).unwrap(), Value::Int64(3));
    }

    #[test]
    fn test_with_columns_length_mismatch() {
        let op = ProjectExec::with_columns(vec![col("a").filter(col("a").gt(lit(1i64)))]);
        assert!(run(&op, &batch()).unwrap_err().is_length_mismatch());
    }
}
