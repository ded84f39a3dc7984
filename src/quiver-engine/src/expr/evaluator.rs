//! Expression evaluator implementation.

use common_error::{QuiverError, QuiverResult};
use log::trace;
use quiver_core::{Column, DataType, Value};
use quiver_logical::expr::FunctionExpr;
use quiver_logical::Expr;

use super::agg::aggregate;
use super::kernels::{binary, broadcast_pair, to_boolean, unary};
use crate::executor::{EvalContext, ELEMENT_COLUMN};
use crate::primitives::{self, EwmKind};

/// Evaluate `expr` against the batch bound in `ctx`.
///
/// Parameters are checked for the whole tree before any evaluation starts.
pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> QuiverResult<Column> {
    validate_parameters(expr)?;
    ExprEvaluator::new().evaluate(expr, ctx)
}

/// Check every parameter in the tree that does not depend on the data.
pub fn validate_parameters(expr: &Expr) -> QuiverResult<()> {
    if let Expr::Function { func, .. } = expr {
        match func {
            FunctionExpr::Sample(options) => options.validate()?,
            FunctionExpr::EwmMean(options)
            | FunctionExpr::EwmStd(options)
            | FunctionExpr::EwmVar(options) => options.validate()?,
            FunctionExpr::Log { base } if !(*base > 0.0 && *base != 1.0) => {
                return Err(QuiverError::invalid_parameter(format!(
                    "log base must be positive and not 1, got {base}"
                )))
            }
            FunctionExpr::ListEval { expr, .. } => validate_parameters(expr)?,
            _ => {}
        }
    }
    expr.children().into_iter().try_for_each(validate_parameters)
}

/// Expression evaluator for columnar execution.
///
/// Evaluates an [`Expr`] to a [`Column`] against the batch bound in an
/// [`EvalContext`]. Scalar-producing nodes return a single row; callers
/// broadcast as needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    /// Create a new expression evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate an expression without the parameter pre-check.
    pub fn evaluate(&self, expr: &Expr, ctx: &EvalContext<'_>) -> QuiverResult<Column> {
        trace!("evaluating {expr}");
        match expr {
            Expr::Column(name) => Ok(ctx.batch().column(name)?.clone()),

            Expr::Literal { value, dtype } => self.eval_literal(value, dtype),

            Expr::Binary { left, op, right } => {
                let l = self.evaluate(left, ctx)?;
                let r = self.evaluate(right, ctx)?;
                binary(l, *op, r)
            }

            Expr::Unary { op, expr } => unary(*op, self.evaluate(expr, ctx)?),

            Expr::Agg(agg) => aggregate(agg.func, &self.evaluate(&agg.expr, ctx)?),

            Expr::Function { func, args } => self.eval_function(func, args, ctx),

            Expr::Alias { expr, name } => Ok(self.evaluate(expr, ctx)?.rename(name.as_str())),

            Expr::MapAlias { expr, mapping } => {
                let column = self.evaluate(expr, ctx)?;
                let name = mapping.apply(column.name());
                Ok(column.rename(name))
            }

            Expr::Filter { expr, predicate } => self.eval_filter(expr, predicate, ctx),

            Expr::Cast { expr, dtype } => self.evaluate(expr, ctx)?.cast(dtype),

            Expr::Selector(selector) => Err(QuiverError::invalid_parameter(format!(
                "selector {selector} must be expanded against a schema before evaluation"
            ))),

            Expr::Element => {
                if !ctx.in_list_eval() {
                    return Err(QuiverError::invalid_parameter(
                        "element() is only valid inside list_eval",
                    ));
                }
                Ok(ctx.batch().column(ELEMENT_COLUMN)?.clone())
            }

            Expr::Count => {
                let height = u32::try_from(ctx.height())
                    .map_err(|_| QuiverError::compute("row count exceeds UInt32 range"))?;
                Column::from_typed_values("count", DataType::UInt32, &[Value::UInt32(height)])
            }

            Expr::Fold { acc, op, exprs } => {
                let acc = self.evaluate(acc, ctx)?;
                let inputs = self.eval_all(exprs, ctx)?;
                primitives::fold_skip_nulls(Some(acc), *op, inputs)
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr], ctx: &EvalContext<'_>) -> QuiverResult<Vec<Column>> {
        exprs.iter().map(|e| self.evaluate(e, ctx)).collect()
    }

    fn eval_literal(&self, value: &Value, dtype: &DataType) -> QuiverResult<Column> {
        if value.is_null() {
            return Ok(Column::full_null("literal", dtype.clone(), 1));
        }
        Column::from_typed_values("literal", dtype.clone(), std::slice::from_ref(value))
    }

    fn eval_filter(
        &self,
        expr: &Expr,
        predicate: &Expr,
        ctx: &EvalContext<'_>,
    ) -> QuiverResult<Column> {
        let column = self.evaluate(expr, ctx)?;
        let mask = self.evaluate(predicate, ctx)?;
        let (column, mask) = broadcast_pair(column, mask, "filter")?;
        column.filter(&to_boolean(&mask, "filter")?)
    }

    fn eval_function(
        &self,
        func: &FunctionExpr,
        args: &[Expr],
        ctx: &EvalContext<'_>,
    ) -> QuiverResult<Column> {
        // Functions that control evaluation of their own arguments.
        match func {
            FunctionExpr::MapDict { mapping } => {
                let input = self.evaluate(first_arg(args, func)?, ctx)?;
                let default = args.get(1).map(|d| move || self.evaluate(d, ctx));
                return primitives::map_dict(&input, mapping, default);
            }
            FunctionExpr::ListEval { expr, parallel } => {
                let input = self.evaluate(first_arg(args, func)?, ctx)?;
                return primitives::list_eval(&input, expr, *parallel, ctx);
            }
            _ => {}
        }

        let cols = self.eval_all(args, ctx)?;
        let input = || nth(&cols, 0, func);
        let other = || nth(&cols, 1, func);
        match func {
            FunctionExpr::Rank(options) => primitives::rank(input()?, *options),
            FunctionExpr::Unique { stable } => primitives::unique(input()?, *stable),
            FunctionExpr::UniqueCounts => primitives::unique_counts(input()?),
            FunctionExpr::SearchSorted { side } => {
                primitives::search_sorted(input()?, other()?, *side)
            }
            FunctionExpr::CumCount { reverse } => primitives::cumcount(input()?, *reverse),
            FunctionExpr::EwmMean(options) => primitives::ewm(input()?, EwmKind::Mean, *options),
            FunctionExpr::EwmVar(options) => primitives::ewm(input()?, EwmKind::Var, *options),
            FunctionExpr::EwmStd(options) => primitives::ewm(input()?, EwmKind::Std, *options),
            FunctionExpr::Sample(options) => primitives::sample(input()?, *options, ctx.random()),
            FunctionExpr::Shuffle { seed } => primitives::shuffle(input()?, *seed, ctx.random()),
            FunctionExpr::DropNulls => primitives::drop_nulls(input()?),
            FunctionExpr::Reverse => input()?.reverse(),
            FunctionExpr::Rechunk => input()?.rechunk(),
            FunctionExpr::Append => input()?.append(other()?),
            FunctionExpr::Concat => primitives::concat(cols),
            FunctionExpr::ConcatList => primitives::concat_list(cols),
            FunctionExpr::Repeat { n } => primitives::repeat(input()?, *n),
            FunctionExpr::Diff { n } => primitives::diff(input()?, *n),
            FunctionExpr::Log { base } => primitives::log(input()?, *base),
            FunctionExpr::Dot => primitives::dot(input()?.clone(), other()?.clone()),
            FunctionExpr::Horizontal(op) => primitives::horizontal(*op, cols),
            FunctionExpr::ListJoin { separator } => primitives::list_join(input()?, separator),
            FunctionExpr::ListContains => primitives::list_contains(input()?, other()?.clone()),
            FunctionExpr::MapDict { .. } | FunctionExpr::ListEval { .. } => Err(
                QuiverError::internal(format!("'{func}' reached the generic function path")),
            ),
        }
    }
}

fn first_arg<'e>(args: &'e [Expr], func: &FunctionExpr) -> QuiverResult<&'e Expr> {
    args.first().ok_or_else(|| {
        QuiverError::invalid_parameter(format!("'{func}' expects an input expression"))
    })
}

fn nth<'c>(cols: &'c [Column], i: usize, func: &FunctionExpr) -> QuiverResult<&'c Column> {
    cols.get(i).ok_or_else(|| {
        QuiverError::invalid_parameter(format!("'{func}' expects at least {} arguments", i + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::ExecutionConfig;
    use quiver_core::Batch;
    use quiver_logical::expr::{col, element, lit, RankMethod, SampleOptions};

    use crate::executor::RandomSource;

    fn batch() -> Batch {
        Batch::new(vec![
            Column::from_iter_values("a", [Some(1i64), Some(2), None, Some(4)]).unwrap(),
            Column::from_iter_values("b", ["x", "y", "x", "z"]).unwrap(),
        ])
        .unwrap()
    }

    fn eval(expr: &Expr) -> QuiverResult<Column> {
        let batch = batch();
        let config = ExecutionConfig::default();
        let random = RandomSource::new(Some(0));
        evaluate(expr, &EvalContext::new(&batch, &config, &random))
    }

    #[test]
    fn test_literal_is_single_row() {
        let out = eval(&lit(5i64)).unwrap();
        assert_eq!(out.name(), "literal");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_binary_keeps_left_name() {
        let out = eval(&(col("a") + lit(1i64))).unwrap();
        assert_eq!(out.name(), "a");
        assert_eq!(
            out.to_values().unwrap(),
            vec![Value::Int64(2), Value::Int64(3), Value::Null, Value::Int64(5)]
        );
    }

    #[test]
    fn test_filter_expression() {
        let out = eval(&col("b").filter(col("a").gt(lit(1i64)))).unwrap();
        assert_eq!(out.to_values().unwrap(), vec![Value::from("y"), Value::from("z")]);
    }

    #[test]
    fn test_filter_requires_boolean_predicate() {
        let err = eval(&col("b").filter(col("a"))).unwrap_err();
        assert!(err.is_dtype_mismatch());
    }

    #[test]
    fn test_unresolved_column() {
        let err = eval(&col("missing")).unwrap_err();
        assert!(err.is_unresolved_column());
    }

    #[test]
    fn test_element_outside_list_eval() {
        let err = eval(&element()).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_parameters_checked_before_evaluation() {
        // The missing column would fail later; the bad sample size is reported first.
        let expr = col("missing").sample(SampleOptions::n(-1));
        let err = eval(&expr).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_count_and_agg() {
        let count = eval(&quiver_logical::expr::count()).unwrap();
        assert_eq!(count.get(0).unwrap(), Value::UInt32(4));
        let non_null = eval(&col("a").count()).unwrap();
        assert_eq!(non_null.get(0).unwrap(), Value::UInt32(3));
    }

    #[test]
    fn test_function_dispatch() {
        let out = eval(&col("a").rank(RankMethod::Dense, false).alias("r")).unwrap();
        assert_eq!(out.name(), "r");
        assert_eq!(out.null_count(), 1);
    }

    #[test]
    fn test_map_alias_renames() {
        let out = eval(&col("a").suffix("_x")).unwrap();
        assert_eq!(out.name(), "a_x");
    }
}
