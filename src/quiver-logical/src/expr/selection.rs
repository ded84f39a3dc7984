//! Column selectors and their expansion against a schema.

use common_error::{QuiverError, QuiverResult};
use quiver_core::{DataType, Field};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Expr, FunctionExpr};

/// Dtype pattern matched by [`Selector::Dtypes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DtypeGroup {
    /// Exactly this dtype.
    Exact(DataType),
    /// Any signed or unsigned integer.
    Integer,
    /// Any float.
    Float,
    /// Any integer or float.
    Numeric,
    /// Any datetime, whatever its unit and zone.
    Datetime,
    /// Any duration.
    Duration,
    /// Any list.
    List,
}

impl DtypeGroup {
    /// Whether `dtype` belongs to this group.
    pub fn matches(&self, dtype: &DataType) -> bool {
        match self {
            Self::Exact(expected) => expected == dtype,
            Self::Integer => dtype.is_integer(),
            Self::Float => dtype.is_float(),
            Self::Numeric => dtype.is_numeric(),
            Self::Datetime => matches!(dtype, DataType::Datetime(..)),
            Self::Duration => matches!(dtype, DataType::Duration(_)),
            Self::List => matches!(dtype, DataType::List(_)),
        }
    }
}

impl From<DataType> for DtypeGroup {
    fn from(dtype: DataType) -> Self {
        Self::Exact(dtype)
    }
}

/// A set of columns chosen by pattern rather than by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selector {
    /// Every column.
    All,
    /// Columns whose dtype matches one of the groups.
    Dtypes(Vec<DtypeGroup>),
    /// Columns whose name matches the regex.
    Regex(String),
}

impl Selector {
    /// Names of the matching columns, in schema order.
    pub fn select(&self, schema: &[Field]) -> QuiverResult<Vec<String>> {
        let names = match self {
            Self::All => schema.iter().map(|f| f.name.clone()).collect(),
            Self::Dtypes(groups) => schema
                .iter()
                .filter(|f| groups.iter().any(|g| g.matches(&f.dtype)))
                .map(|f| f.name.clone())
                .collect(),
            Self::Regex(pattern) => {
                let re = Regex::new(pattern).map_err(|e| {
                    QuiverError::invalid_parameter(format!("invalid column regex '{pattern}': {e}"))
                })?;
                schema
                    .iter()
                    .filter(|f| re.is_match(&f.name))
                    .map(|f| f.name.clone())
                    .collect()
            }
        };
        Ok(names)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all()"),
            Self::Dtypes(groups) => write!(f, "cols_by_dtype({groups:?})"),
            Self::Regex(pattern) => write!(f, "col(\"{pattern}\")"),
        }
    }
}

/// Expand selectors and resolve name mappings.
///
/// An expression containing a selector is instantiated once per matching
/// column, in schema order; every selector in that expression is bound to the
/// same column. Selectors inside the input list of a multi-input node (`fold`,
/// the horizontal reducers, `concat`, `concat_list`) expand in place into that
/// list instead. Name mappings are then applied to the resolved output names,
/// so `all().suffix("_x")` renames every expanded column.
pub fn expand_selection(exprs: &[Expr], schema: &[Field]) -> QuiverResult<Vec<Expr>> {
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = expand_inputs(expr, schema)?;
        match expr.find_selector() {
            Some(selector) => {
                for name in selector.select(schema)? {
                    let bound = expr.rewrite(&|e| match e {
                        Expr::Selector(_) => Some(Expr::Column(name.clone())),
                        _ => None,
                    });
                    out.push(resolve_name_mappings(&bound));
                }
            }
            None => out.push(resolve_name_mappings(&expr)),
        }
    }
    Ok(out)
}

fn expand_inputs(expr: &Expr, schema: &[Field]) -> QuiverResult<Expr> {
    let expanded = match expr {
        Expr::Fold { acc, op, exprs } => Expr::Fold {
            acc: Box::new(expand_inputs(acc, schema)?),
            op: *op,
            exprs: expand_selection(exprs, schema)?,
        },
        Expr::Function {
            func:
                func @ (FunctionExpr::Horizontal(_)
                | FunctionExpr::Concat
                | FunctionExpr::ConcatList),
            args,
        } => Expr::Function {
            func: func.clone(),
            args: expand_selection(args, schema)?,
        },
        other => {
            let mut first_err = None;
            let rebuilt = other.map_children(&mut |child| match expand_inputs(child, schema) {
                Ok(e) => e,
                Err(e) => {
                    first_err.get_or_insert(e);
                    child.clone()
                }
            });
            if let Some(err) = first_err {
                return Err(err);
            }
            rebuilt
        }
    };
    Ok(expanded)
}

fn resolve_name_mappings(expr: &Expr) -> Expr {
    expr.rewrite(&|e| match e {
        Expr::MapAlias { expr, mapping } => {
            let inner = resolve_name_mappings(expr);
            let name = inner.output_name()?;
            Some(inner.alias(mapping.apply(&name)))
        }
        _ => None,
    })
}
