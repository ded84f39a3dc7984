//! Expression tree.

use common_display::{DisplayTree, TreeNode};
use common_error::QuiverResult;
use quiver_core::{DataType, Value};
use serde::{Deserialize, Serialize};

use super::options::{
    EwmOptions, NameMapping, RankMethod, RankOptions, SampleOptions, SearchSortedSide,
};
use super::selection::Selector;
use super::{AggExpr, AggFunc, BinaryOp, FunctionExpr, HorizontalOp, UnaryOp};

/// An immutable expression node.
///
/// Children are exclusively owned by their parent; evaluation never mutates a
/// node. Boolean combination goes through [`Expr::and_`], [`Expr::or_`] and
/// [`Expr::xor`]; the native `&&`/`||` operators are deliberately unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Column reference.
    Column(String),
    /// Literal value with its dtype (kept for typed nulls).
    Literal {
        /// The value.
        value: Value,
        /// Dtype of the value.
        dtype: DataType,
    },
    /// Binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Aggregation.
    Agg(AggExpr),
    /// Built-in function applied to `args`.
    Function {
        /// The function.
        func: FunctionExpr,
        /// Arguments; the first is the input column.
        args: Vec<Expr>,
    },
    /// Rename the output.
    Alias {
        /// Renamed expression.
        expr: Box<Expr>,
        /// New name.
        name: String,
    },
    /// Rewrite the output name through a mapping.
    MapAlias {
        /// Renamed expression.
        expr: Box<Expr>,
        /// Name mapping.
        mapping: NameMapping,
    },
    /// Keep the rows where `predicate` is true.
    Filter {
        /// Filtered expression.
        expr: Box<Expr>,
        /// Boolean predicate; null excludes the row.
        predicate: Box<Expr>,
    },
    /// Type cast.
    Cast {
        /// Cast expression.
        expr: Box<Expr>,
        /// Target dtype.
        dtype: DataType,
    },
    /// Column selector expanded against a schema.
    Selector(Selector),
    /// The list cell currently evaluated by `list_eval`.
    Element,
    /// Number of rows, nulls included.
    Count,
    /// Left fold of `exprs` into `acc` with `op`, skipping nulls per row.
    Fold {
        /// Initial accumulator.
        acc: Box<Expr>,
        /// Combining operator.
        op: BinaryOp,
        /// Folded expressions.
        exprs: Vec<Expr>,
    },
}

// ============================================================================
// Constructors
// ============================================================================

/// Reference a column by name.
///
/// `"*"` selects every column and a name wrapped in `^...$` is a regex selector.
pub fn col(name: impl Into<String>) -> Expr {
    let name = name.into();
    if name == "*" {
        Expr::Selector(Selector::All)
    } else if name.len() > 1 && name.starts_with('^') && name.ends_with('$') {
        Expr::Selector(Selector::Regex(name))
    } else {
        Expr::Column(name)
    }
}

/// Reference several columns by name.
pub fn cols<I, S>(names: I) -> Vec<Expr>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(col).collect()
}

/// Literal value; the dtype is the value's own dtype.
pub fn lit(value: impl Into<Value>) -> Expr {
    let value = value.into();
    Expr::Literal {
        dtype: value.dtype(),
        value,
    }
}

/// Literal cast to `dtype` at construction.
///
/// Fails with `DtypeMismatch` when the value cannot be represented, including a
/// zoned instant given a dtype with a different zone.
/// A zoned instant typed as a naive datetime keeps its own zone.
pub fn lit_typed(value: impl Into<Value>, dtype: DataType) -> QuiverResult<Expr> {
    let value = value.into().cast(&dtype)?;
    let dtype = match (&value, dtype) {
        (Value::Datetime(_, _, Some(_)), DataType::Datetime(..)) => value.dtype(),
        (_, dtype) => dtype,
    };
    Ok(Expr::Literal { value, dtype })
}

/// Select every column.
pub fn all() -> Expr {
    Expr::Selector(Selector::All)
}

/// Select every column whose dtype matches one of `dtypes`.
pub fn cols_by_dtype(dtypes: Vec<super::DtypeGroup>) -> Expr {
    Expr::Selector(Selector::Dtypes(dtypes))
}

/// Select every column whose name matches `pattern`.
pub fn cols_regex(pattern: impl Into<String>) -> Expr {
    Expr::Selector(Selector::Regex(pattern.into()))
}

/// The list cell bound by `list_eval`.
pub fn element() -> Expr {
    Expr::Element
}

/// Row count, nulls included.
pub fn count() -> Expr {
    Expr::Count
}

/// Repeat a scalar expression `n` times.
pub fn repeat(value: Expr, n: usize) -> Expr {
    Expr::function(FunctionExpr::Repeat { n }, vec![value])
}

/// Vertical concatenation into a single chunk.
pub fn concat(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Concat, exprs)
}

/// Row-wise concatenation into a list column.
pub fn concat_list(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::ConcatList, exprs)
}

/// Left fold of `exprs` into `acc`, skipping nulls per row.
pub fn fold(acc: Expr, op: BinaryOp, exprs: Vec<Expr>) -> Expr {
    Expr::Fold {
        acc: Box::new(acc),
        op,
        exprs,
    }
}

/// Row-wise minimum, skipping nulls.
pub fn min_horizontal(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Horizontal(HorizontalOp::Min), exprs)
}

/// Row-wise maximum, skipping nulls.
pub fn max_horizontal(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Horizontal(HorizontalOp::Max), exprs)
}

/// Row-wise sum, skipping nulls.
pub fn sum_horizontal(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Horizontal(HorizontalOp::Sum), exprs)
}

/// Row-wise logical OR, skipping nulls.
pub fn any_horizontal(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Horizontal(HorizontalOp::Any), exprs)
}

/// Row-wise logical AND, skipping nulls.
pub fn all_horizontal(exprs: Vec<Expr>) -> Expr {
    Expr::function(FunctionExpr::Horizontal(HorizontalOp::All), exprs)
}

impl Expr {
    /// Create a binary expression.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    /// Create a function expression.
    pub fn function(func: FunctionExpr, args: Vec<Expr>) -> Self {
        Self::Function { func, args }
    }

    fn agg(self, func: AggFunc) -> Self {
        Self::Agg(AggExpr::new(func, self))
    }

    fn apply(self, func: FunctionExpr) -> Self {
        Self::function(func, vec![self])
    }

    // Arithmetic operators

    // `+`, `-`, `*`, `%` and unary `-`/`!` come from the `std::ops` impls below.

    /// Floor division for integers, exact division for floats.
    pub fn floor_div(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Divide, other)
    }

    /// True division; always produces a float.
    pub fn truediv(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::TrueDivide, other)
    }

    /// Modulo.
    pub fn modulo(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Modulo, other)
    }

    /// Power.
    pub fn pow(self, exponent: Expr) -> Self {
        Self::binary(self, BinaryOp::Pow, exponent)
    }

    // Comparison operators

    /// Equality comparison.
    pub fn eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Inequality comparison.
    pub fn neq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::NotEq, other)
    }

    /// Less than comparison.
    pub fn lt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// Less than or equal comparison.
    pub fn lt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::LtEq, other)
    }

    /// Greater than comparison.
    pub fn gt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Greater than or equal comparison.
    pub fn gt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::GtEq, other)
    }

    /// Null-safe equality: null equals null.
    pub fn eq_missing(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::EqMissing, other)
    }

    /// Null-safe inequality.
    pub fn neq_missing(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::NotEqMissing, other)
    }

    // Logical operators

    /// Logical AND (Kleene).
    pub fn and_(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Logical OR (Kleene).
    pub fn or_(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Logical XOR.
    pub fn xor(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Xor, other)
    }

    /// Logical NOT.
    pub fn not_(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        Self::unary(UnaryOp::Abs, self)
    }

    // Null checks

    /// Is null check.
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOp::IsNull, self)
    }

    /// Is not null check.
    pub fn is_not_null(self) -> Self {
        Self::unary(UnaryOp::IsNotNull, self)
    }

    // Naming

    /// Rename the output.
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Rewrite the output name through `mapping`.
    pub fn map_alias(self, mapping: NameMapping) -> Self {
        Self::MapAlias {
            expr: Box::new(self),
            mapping,
        }
    }

    /// Prepend `prefix` to the output name.
    pub fn prefix(self, prefix: impl Into<String>) -> Self {
        self.map_alias(NameMapping::Prefix(prefix.into()))
    }

    /// Append `suffix` to the output name.
    pub fn suffix(self, suffix: impl Into<String>) -> Self {
        self.map_alias(NameMapping::Suffix(suffix.into()))
    }

    // Row selection and types

    /// Keep rows where `predicate` is true.
    pub fn filter(self, predicate: Expr) -> Self {
        Self::Filter {
            expr: Box::new(self),
            predicate: Box::new(predicate),
        }
    }

    /// Cast to `dtype`.
    pub fn cast(self, dtype: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            dtype,
        }
    }

    // Aggregations

    /// Sum of non-null values.
    pub fn sum(self) -> Self {
        self.agg(AggFunc::Sum)
    }

    /// Mean of non-null values.
    pub fn mean(self) -> Self {
        self.agg(AggFunc::Mean)
    }

    /// Minimum non-null value.
    pub fn min(self) -> Self {
        self.agg(AggFunc::Min)
    }

    /// Maximum non-null value.
    pub fn max(self) -> Self {
        self.agg(AggFunc::Max)
    }

    /// First value.
    pub fn first(self) -> Self {
        self.agg(AggFunc::First)
    }

    /// Last value.
    pub fn last(self) -> Self {
        self.agg(AggFunc::Last)
    }

    /// Count of non-null values. Compare [`count`], which counts all rows.
    pub fn count(self) -> Self {
        self.agg(AggFunc::Count)
    }

    /// Count of null values.
    pub fn null_count(self) -> Self {
        self.agg(AggFunc::NullCount)
    }

    /// Number of distinct values.
    pub fn n_unique(self) -> Self {
        self.agg(AggFunc::NUnique)
    }

    /// Collect all values into one list cell.
    pub fn implode(self) -> Self {
        self.agg(AggFunc::Implode)
    }

    /// Shannon entropy of the empirical value distribution.
    pub fn entropy(self, base: Option<f64>, normalize: bool) -> Self {
        self.agg(AggFunc::Entropy { base, normalize })
    }

    /// Dot product with `other`.
    pub fn dot(self, other: Expr) -> Self {
        Self::function(FunctionExpr::Dot, vec![self, other])
    }

    // Algorithmic primitives

    /// Rank of each non-null value; nulls keep a null rank.
    pub fn rank(self, method: RankMethod, descending: bool) -> Self {
        self.apply(FunctionExpr::Rank(RankOptions { method, descending }))
    }

    /// Distinct values in sorted order.
    pub fn unique(self) -> Self {
        self.apply(FunctionExpr::Unique { stable: false })
    }

    /// Distinct values in first-occurrence order.
    pub fn unique_stable(self) -> Self {
        self.apply(FunctionExpr::Unique { stable: true })
    }

    /// Occurrence count per distinct value, in first-occurrence order.
    pub fn unique_counts(self) -> Self {
        self.apply(FunctionExpr::UniqueCounts)
    }

    /// Insertion index of every value of `query` into this sorted expression.
    pub fn search_sorted(self, query: Expr, side: SearchSortedSide) -> Self {
        Self::function(FunctionExpr::SearchSorted { side }, vec![self, query])
    }

    /// Row number, from the start or from the end.
    pub fn cumcount(self, reverse: bool) -> Self {
        self.apply(FunctionExpr::CumCount { reverse })
    }

    /// Exponentially weighted moving mean.
    pub fn ewm_mean(self, options: EwmOptions) -> Self {
        self.apply(FunctionExpr::EwmMean(options))
    }

    /// Exponentially weighted moving standard deviation.
    pub fn ewm_std(self, options: EwmOptions) -> Self {
        self.apply(FunctionExpr::EwmStd(options))
    }

    /// Exponentially weighted moving variance.
    pub fn ewm_var(self, options: EwmOptions) -> Self {
        self.apply(FunctionExpr::EwmVar(options))
    }

    /// Remap values through `mapping`; unmapped rows take `default`'s value for
    /// the same row, or null without a default.
    pub fn map_dict(self, mapping: Vec<(Value, Value)>, default: Option<Expr>) -> Self {
        let mut args = vec![self];
        args.extend(default);
        Self::function(FunctionExpr::MapDict { mapping }, args)
    }

    /// Random sample.
    pub fn sample(self, options: SampleOptions) -> Self {
        self.apply(FunctionExpr::Sample(options))
    }

    /// Random sample of `n` rows.
    pub fn sample_n(self, n: i64, with_replacement: bool, seed: Option<u64>) -> Self {
        self.sample(
            SampleOptions::n(n)
                .with_replacement(with_replacement)
                .with_seed(seed),
        )
    }

    /// Random sample of a fraction of the rows.
    pub fn sample_frac(self, fraction: f64, with_replacement: bool, seed: Option<u64>) -> Self {
        self.sample(
            SampleOptions::frac(fraction)
                .with_replacement(with_replacement)
                .with_seed(seed),
        )
    }

    /// Random permutation.
    pub fn shuffle(self, seed: Option<u64>) -> Self {
        self.apply(FunctionExpr::Shuffle { seed })
    }

    // Structural

    /// Drop null rows.
    pub fn drop_nulls(self) -> Self {
        self.apply(FunctionExpr::DropNulls)
    }

    /// Reverse row order.
    pub fn reverse(self) -> Self {
        self.apply(FunctionExpr::Reverse)
    }

    /// Append `other` after this expression, keeping both chunk layouts.
    pub fn append(self, other: Expr) -> Self {
        Self::function(FunctionExpr::Append, vec![self, other])
    }

    /// Coalesce chunks into one.
    pub fn rechunk(self) -> Self {
        self.apply(FunctionExpr::Rechunk)
    }

    /// Difference with the value `n` rows earlier.
    pub fn diff(self, n: i64) -> Self {
        self.apply(FunctionExpr::Diff { n })
    }

    /// Logarithm in `base`.
    pub fn log(self, base: f64) -> Self {
        self.apply(FunctionExpr::Log { base })
    }

    // Lists

    /// Evaluate `expr` against every list cell, with the cell bound to [`element`].
    pub fn list_eval(self, expr: Expr, parallel: bool) -> Self {
        self.apply(FunctionExpr::ListEval {
            expr: Box::new(expr),
            parallel,
        })
    }

    /// Join the strings of every list cell with `separator`.
    pub fn list_join(self, separator: impl Into<String>) -> Self {
        self.apply(FunctionExpr::ListJoin {
            separator: separator.into(),
        })
    }

    /// Whether every list cell contains `item`.
    pub fn list_contains(self, item: Expr) -> Self {
        Self::function(FunctionExpr::ListContains, vec![self, item])
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Column(_)
            | Self::Literal { .. }
            | Self::Selector(_)
            | Self::Element
            | Self::Count => vec![],
            Self::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Unary { expr, .. }
            | Self::Alias { expr, .. }
            | Self::MapAlias { expr, .. }
            | Self::Cast { expr, .. } => vec![expr.as_ref()],
            Self::Agg(agg) => vec![agg.expr.as_ref()],
            Self::Function { args, .. } => args.iter().collect(),
            Self::Filter { expr, predicate } => vec![expr.as_ref(), predicate.as_ref()],
            Self::Fold { acc, exprs, .. } => std::iter::once(acc.as_ref()).chain(exprs).collect(),
        }
    }

    /// Rebuild this node with every child replaced by `f(child)`.
    pub fn map_children(&self, f: &mut dyn FnMut(&Expr) -> Expr) -> Expr {
        match self {
            Self::Column(_)
            | Self::Literal { .. }
            | Self::Selector(_)
            | Self::Element
            | Self::Count => self.clone(),
            Self::Binary { left, op, right } => Self::Binary {
                left: Box::new(f(left.as_ref())),
                op: *op,
                right: Box::new(f(right.as_ref())),
            },
            Self::Unary { op, expr } => Self::Unary {
                op: *op,
                expr: Box::new(f(expr.as_ref())),
            },
            Self::Agg(agg) => Self::Agg(AggExpr::new(agg.func, f(agg.expr.as_ref()))),
            Self::Function { func, args } => Self::Function {
                func: func.clone(),
                args: args.iter().map(|a| f(a)).collect(),
            },
            Self::Alias { expr, name } => Self::Alias {
                expr: Box::new(f(expr.as_ref())),
                name: name.clone(),
            },
            Self::MapAlias { expr, mapping } => Self::MapAlias {
                expr: Box::new(f(expr.as_ref())),
                mapping: mapping.clone(),
            },
            Self::Filter { expr, predicate } => Self::Filter {
                expr: Box::new(f(expr.as_ref())),
                predicate: Box::new(f(predicate.as_ref())),
            },
            Self::Cast { expr, dtype } => Self::Cast {
                expr: Box::new(f(expr.as_ref())),
                dtype: dtype.clone(),
            },
            Self::Fold { acc, op, exprs } => Self::Fold {
                acc: Box::new(f(acc.as_ref())),
                op: *op,
                exprs: exprs.iter().map(|e| f(e)).collect(),
            },
        }
    }

    /// Top-down rewrite: nodes for which `f` returns `Some` are replaced and not
    /// descended into.
    pub fn rewrite(&self, f: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        match f(self) {
            Some(replaced) => replaced,
            None => self.map_children(&mut |child| child.rewrite(f)),
        }
    }

    /// Name of the column this expression produces.
    ///
    /// Most nodes inherit the name of their first input. Selectors have no
    /// name until expanded.
    pub fn output_name(&self) -> Option<String> {
        match self {
            Self::Column(name) => Some(name.clone()),
            Self::Literal { .. } => Some("literal".to_string()),
            Self::Alias { name, .. } => Some(name.clone()),
            Self::MapAlias { expr, mapping } => expr.output_name().map(|n| mapping.apply(&n)),
            Self::Selector(_) => None,
            Self::Element => Some(String::new()),
            Self::Count => Some("count".to_string()),
            Self::Binary { left, .. } => left.output_name(),
            Self::Unary { expr, .. } | Self::Cast { expr, .. } | Self::Filter { expr, .. } => {
                expr.output_name()
            }
            Self::Agg(agg) => agg.expr.output_name(),
            Self::Function { func, args } => args
                .first()
                .and_then(Expr::output_name)
                .or_else(|| Some(func.name().to_string())),
            Self::Fold { acc, .. } => acc.output_name(),
        }
    }

    /// Whether evaluating the tree draws from the random source, including
    /// inside `list_eval` bodies.
    pub fn draws_random(&self) -> bool {
        match self {
            Self::Function { func, .. } if func.is_random() => true,
            Self::Function {
                func: FunctionExpr::ListEval { expr, .. },
                ..
            } if expr.draws_random() => true,
            _ => self.children().into_iter().any(Expr::draws_random),
        }
    }

    /// Whether evaluation yields exactly one value regardless of input length.
    pub fn returns_scalar(&self) -> bool {
        match self {
            Self::Agg(_) | Self::Count | Self::Literal { .. } => true,
            Self::Column(_) | Self::Selector(_) | Self::Element | Self::Filter { .. } => false,
            Self::Function { func, args } => {
                func.returns_scalar()
                    || (func.is_elementwise()
                        && !func.is_random()
                        && !args.is_empty()
                        && args.iter().all(Expr::returns_scalar))
            }
            Self::Binary { left, right, .. } => left.returns_scalar() && right.returns_scalar(),
            Self::Fold { acc, exprs, .. } => {
                acc.returns_scalar() && exprs.iter().all(Expr::returns_scalar)
            }
            Self::Unary { expr, .. }
            | Self::Alias { expr, .. }
            | Self::MapAlias { expr, .. }
            | Self::Cast { expr, .. } => expr.returns_scalar(),
        }
    }

    /// Names of all columns referenced, in first-seen order.
    pub fn column_refs(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_column_refs(&mut out);
        out
    }

    fn collect_column_refs(&self, out: &mut Vec<String>) {
        if let Self::Column(name) = self {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        for child in self.children() {
            child.collect_column_refs(out);
        }
    }

    /// First selector in the tree, if any.
    pub fn find_selector(&self) -> Option<&Selector> {
        if let Self::Selector(selector) = self {
            return Some(selector);
        }
        self.children().into_iter().find_map(Expr::find_selector)
    }

    /// Render the tree for debugging.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).to_string()
    }
}

impl TreeNode for Expr {
    fn label(&self) -> String {
        match self {
            Self::Column(name) => format!("Column({name})"),
            Self::Literal { value, .. } => format!("Literal({value})"),
            Self::Binary { op, .. } => format!("Binary({op})"),
            Self::Unary { op, .. } => format!("Unary({op})"),
            Self::Agg(agg) => format!("Agg({})", agg.func),
            Self::Function { func, .. } => format!("Function({func})"),
            Self::Alias { name, .. } => format!("Alias({name})"),
            Self::MapAlias { .. } => "MapAlias".to_string(),
            Self::Filter { .. } => "Filter".to_string(),
            Self::Cast { dtype, .. } => format!("Cast({dtype})"),
            Self::Selector(selector) => format!("Selector({selector})"),
            Self::Element => "Element".to_string(),
            Self::Count => "Count".to_string(),
            Self::Fold { op, .. } => format!("Fold({op})"),
        }
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        Expr::children(self)
            .into_iter()
            .map(|c| c as &dyn TreeNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Literal { dtype, .. } => Some(dtype.to_string()),
            Self::Function { func, .. } => func.details(),
            Self::MapAlias { mapping, .. } => Some(format!("{mapping:?}")),
            _ => None,
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl std::ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(self, $op, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Subtract);
impl_binary_op!(Mul, mul, BinaryOp::Multiply);
impl_binary_op!(Rem, rem, BinaryOp::Modulo);

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.not_()
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, exprs: &[Expr]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{e}")?;
    }
    write!(f, "]")
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column(name) => write!(f, "col(\"{name}\")"),
            Self::Literal { value: Value::Utf8(s), .. } => write!(f, "lit(\"{s}\")"),
            Self::Literal { value, .. } => write!(f, "lit({value})"),
            Self::Binary { left, op, right } => write!(f, "[({left}) {op} ({right})]"),
            Self::Unary { op, expr } => write!(f, "{expr}.{op}()"),
            Self::Agg(agg) => write!(f, "{agg}"),
            Self::Function { func, args } => match (func, args.split_first()) {
                (
                    FunctionExpr::Horizontal(_) | FunctionExpr::Concat | FunctionExpr::ConcatList,
                    _,
                )
                | (_, None) => {
                    write!(f, "{func}(")?;
                    write_list(f, args)?;
                    write!(f, ")")
                }
                (_, Some((input, rest))) => {
                    write!(f, "{input}.{func}(")?;
                    for (i, a) in rest.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ")")
                }
            },
            Self::Alias { expr, name } => write!(f, "{expr}.alias(\"{name}\")"),
            Self::MapAlias { expr, mapping } => match mapping {
                NameMapping::Prefix(p) => write!(f, "{expr}.prefix(\"{p}\")"),
                NameMapping::Suffix(s) => write!(f, "{expr}.suffix(\"{s}\")"),
                other => write!(f, "{expr}.map_alias({other:?})"),
            },
            Self::Filter { expr, predicate } => write!(f, "{expr}.filter({predicate})"),
            Self::Cast { expr, dtype } => write!(f, "{expr}.cast({dtype})"),
            Self::Selector(selector) => write!(f, "{selector}"),
            Self::Element => write!(f, "element()"),
            Self::Count => write!(f, "count()"),
            Self::Fold { acc, op, exprs } => {
                write!(f, "fold({acc}, {op}, ")?;
                write_list(f, exprs)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::TimeUnit;

    #[test]
    fn test_expression_building() {
        let expr = col("age").gt(lit(18i64)).and_(col("name").is_not_null());
        assert_eq!(
            expr.to_string(),
            "[([(col(\"age\")) > (lit(18))]) & (col(\"name\").is_not_null())]"
        );
        assert_eq!(expr.column_refs(), vec!["age", "name"]);
    }

    #[test]
    fn test_col_parses_selectors() {
        assert_eq!(col("*"), all());
        assert!(matches!(col("^a.*$"), Expr::Selector(Selector::Regex(_))));
        assert_eq!(col("a"), Expr::Column("a".into()));
    }

    #[test]
    fn test_output_names() {
        assert_eq!(col("a").sum().output_name().unwrap(), "a");
        assert_eq!((col("a") + col("b")).output_name().unwrap(), "a");
        assert_eq!(col("a").alias("x").output_name().unwrap(), "x");
        assert_eq!(col("a").prefix("p_").output_name().unwrap(), "p_a");
        assert_eq!(lit(1i32).output_name().unwrap(), "literal");
        assert_eq!(count().output_name().unwrap(), "count");
        assert!(all().output_name().is_none());
    }

    #[test]
    fn test_returns_scalar() {
        assert!(col("a").sum().returns_scalar());
        assert!((col("a").sum() + lit(1i64)).returns_scalar());
        assert!(col("a").dot(col("b")).returns_scalar());
        assert!(!col("a").rank(RankMethod::Dense, false).returns_scalar());
        assert!(!col("a").filter(col("b")).returns_scalar());
        assert!(count().alias("n").returns_scalar());
    }

    #[test]
    fn test_lit_typed_zone_conflict() {
        let zoned = Value::Datetime(0, TimeUnit::Microseconds, Some("Asia/Kathmandu".into()));
        let err = lit_typed(
            zoned.clone(),
            DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into())),
        )
        .unwrap_err();
        assert!(err.is_dtype_mismatch());

        let naive = Value::Datetime(0, TimeUnit::Microseconds, None);
        let ok = lit_typed(
            naive,
            DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into())),
        )
        .unwrap();
        assert!(matches!(ok, Expr::Literal { value: Value::Datetime(_, _, Some(_)), .. }));
    }

    #[test]
    fn test_lit_typed_naive_dtype_keeps_value_zone() {
        let zoned = Value::Datetime(0, TimeUnit::Microseconds, Some("Asia/Kathmandu".into()));
        let expr = lit_typed(zoned, DataType::Datetime(TimeUnit::Microseconds, None)).unwrap();
        let Expr::Literal { dtype, .. } = expr else {
            panic!("expected a literal");
        };
        assert_eq!(
            dtype,
            DataType::Datetime(TimeUnit::Microseconds, Some("Asia/Kathmandu".into()))
        );
    }

    #[test]
    fn test_draws_random() {
        assert!(col("a").shuffle(None).sum().draws_random());
        assert!(col("l").list_eval(element().shuffle(None), false).draws_random());
        assert!(!col("a").rank(RankMethod::Dense, false).draws_random());
    }

    #[test]
    fn test_operator_traits() {
        assert_eq!(
            col("a") + lit(1i64),
            Expr::binary(col("a"), BinaryOp::Add, lit(1i64))
        );
        assert_eq!(
            col("a") - col("b"),
            Expr::binary(col("a"), BinaryOp::Subtract, col("b"))
        );
        assert_eq!(col("a") * col("b"), Expr::binary(col("a"), BinaryOp::Multiply, col("b")));
        assert_eq!(col("a") % lit(2i64), col("a").modulo(lit(2i64)));
        assert_eq!(-col("a"), Expr::unary(UnaryOp::Neg, col("a")));
        assert_eq!(!col("p"), col("p").not_());
    }

    #[test]
    fn test_typed_null_literal() {
        let expr = lit_typed(Value::Null, DataType::Int16).unwrap();
        assert_eq!(
            expr,
            Expr::Literal {
                value: Value::Null,
                dtype: DataType::Int16
            }
        );
    }

    #[test]
    fn test_rewrite_replaces_columns() {
        let expr = (col("a") + col("b")).alias("out");
        let rewritten = expr.rewrite(&|e| match e {
            Expr::Column(name) if name == "a" => Some(col("z")),
            _ => None,
        });
        assert_eq!(rewritten.column_refs(), vec!["z", "b"]);
    }

    #[test]
    fn test_explain() {
        let expr = (col("a") + lit(1i64)).alias("b");
        assert_eq!(
            expr.explain(),
            "Alias(b)\n└─ Binary(+)\n   ├─ Column(a)\n   └─ Literal(1) (Int64)\n"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let expr = col("x")
            .map_dict(vec![(lit_value(1), lit_value(10))], Some(col("y")))
            .ewm_mean(EwmOptions::from_alpha(0.5).unwrap())
            .filter(col("keep"))
            .suffix("_out");
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }

    fn lit_value(v: i64) -> Value {
        Value::Int64(v)
    }
}
