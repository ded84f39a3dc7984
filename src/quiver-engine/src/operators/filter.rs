//! Filter execution operator.

use common_error::QuiverResult;
use log::debug;
use quiver_core::Batch;
use quiver_logical::Expr;

use crate::executor::EvalContext;
use crate::expr::kernels::to_boolean;
use crate::expr::{validate_parameters, ExprEvaluator};
use crate::operators::Operator;

/// Keep the rows where a Boolean predicate is true. Null counts as false.
#[derive(Debug, Clone)]
pub struct FilterExec {
    predicate: Expr,
}

impl FilterExec {
    /// Create a filter with `predicate`.
    pub fn new(predicate: Expr) -> Self {
        Self { predicate }
    }

    /// The filter predicate.
    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }
}

impl Operator for FilterExec {
    fn name(&self) -> &'static str {
        "FilterExec"
    }

    fn execute(&self, ctx: &EvalContext<'_>) -> QuiverResult<Batch> {
        validate_parameters(&self.predicate)?;
        let mask = ExprEvaluator::new()
            .evaluate(&self.predicate, ctx)?
            .broadcast(ctx.height())?;
        let mask = to_boolean(&mask, "filter")?;
        let columns = ctx
            .batch()
            .columns()
            .iter()
            .map(|c| c.filter(&mask))
            .collect::<QuiverResult<Vec<_>>>()?;
        let out = Batch::new(columns)?;
        debug!("FilterExec kept {} of {} rows", out.height(), ctx.height());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::ExecutionConfig;
    use quiver_core::{Column, Value};
    use quiver_logical::expr::{col, lit};

    use crate::executor::RandomSource;

    #[test]
    fn test_filter_drops_false_and_null() {
        let batch = Batch::new(vec![
            Column::from_iter_values("a", [Some(1i64), None, Some(3)]).unwrap(),
            Column::from_iter_values("b", ["x", "y", "z"]).unwrap(),
        ])
        .unwrap();
        let config = ExecutionConfig::default();
        let random = RandomSource::default();
        let ctx = EvalContext::new(&batch, &config, &random);
        let out = FilterExec::new(col("a").gt(lit(1i64))).execute(&ctx).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.column("b").unwrap().get(0).unwrap(), Value::from("z"));

        let all = FilterExec::new(lit(true)).execute(&ctx).unwrap();
        assert_eq!(all.height(), 3);
    }
}
