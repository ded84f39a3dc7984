//! Exponentially weighted moving statistics.
//!
//! The recurrences run over a streaming state that is fed chunk by chunk, so a
//! column produces the same output however it is split into chunks.

use std::sync::Arc;

use arrow::array::Float64Array;
use common_error::QuiverResult;
use quiver_core::types::check_numeric;
use quiver_core::{Column, DataType};
use quiver_logical::expr::EwmOptions;

/// Which statistic to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EwmKind {
    Mean,
    Var,
    Std,
}

/// Running state of the weighted mean and variance.
#[derive(Debug)]
struct EwmState {
    kind: EwmKind,
    options: EwmOptions,
    old_wt_factor: f64,
    new_wt: f64,
    mean: Option<f64>,
    cov: f64,
    old_wt: f64,
    sum_wt: f64,
    sum_wt2: f64,
    nobs: usize,
}

impl EwmState {
    fn new(kind: EwmKind, options: EwmOptions) -> Self {
        Self {
            kind,
            options,
            old_wt_factor: 1.0 - options.alpha,
            new_wt: if options.adjust { 1.0 } else { options.alpha },
            mean: None,
            cov: 0.0,
            old_wt: 1.0,
            sum_wt: 1.0,
            sum_wt2: 1.0,
            nobs: 0,
        }
    }

    /// Feed the next value; returns the statistic at this position.
    fn push(&mut self, value: Option<f64>) -> Option<f64> {
        let observed = value.filter(|v| !v.is_nan());
        if observed.is_some() {
            self.nobs += 1;
        }
        match (self.mean, observed) {
            (Some(mean), cur) if cur.is_some() || !self.options.ignore_nulls => {
                self.old_wt *= self.old_wt_factor;
                self.sum_wt *= self.old_wt_factor;
                self.sum_wt2 *= self.old_wt_factor * self.old_wt_factor;
                if let Some(cur) = cur {
                    let total = self.old_wt + self.new_wt;
                    let new_mean = if mean == cur {
                        mean
                    } else {
                        (self.old_wt * mean + self.new_wt * cur) / total
                    };
                    let shift = mean - new_mean;
                    let dev = cur - new_mean;
                    self.cov = (self.old_wt * (self.cov + shift * shift)
                        + self.new_wt * dev * dev)
                        / total;
                    self.mean = Some(new_mean);
                    self.sum_wt += self.new_wt;
                    self.sum_wt2 += self.new_wt * self.new_wt;
                    self.old_wt += self.new_wt;
                    if !self.options.adjust {
                        self.sum_wt /= self.old_wt;
                        self.sum_wt2 /= self.old_wt * self.old_wt;
                        self.old_wt = 1.0;
                    }
                }
            }
            (None, Some(cur)) => self.mean = Some(cur),
            _ => {}
        }

        // Null inputs stay null in the output.
        value?;
        if self.nobs < self.options.min_periods.max(1) {
            return None;
        }
        match self.kind {
            EwmKind::Mean => self.mean,
            EwmKind::Var => Some(self.variance()),
            EwmKind::Std => Some(self.variance().sqrt()),
        }
    }

    fn variance(&self) -> f64 {
        if self.options.bias {
            return self.cov;
        }
        let numerator = self.sum_wt * self.sum_wt;
        let denominator = numerator - self.sum_wt2;
        if denominator > 0.0 {
            numerator / denominator * self.cov
        } else {
            f64::NAN
        }
    }
}

/// Weighted statistic of a numeric column. `Float32` input stays `Float32`.
pub(crate) fn ewm(input: &Column, kind: EwmKind, options: EwmOptions) -> QuiverResult<Column> {
    options.validate()?;
    let dtype = input.dtype();
    check_numeric(dtype, "exponentially weighted statistics")?;
    let mut state = EwmState::new(kind, options);
    let mut out = Vec::with_capacity(input.len());
    for chunk in input.chunk_f64()? {
        out.extend(chunk.into_iter().map(|v| state.push(v)));
    }
    let column = Column::from_array(input.name(), Arc::new(Float64Array::from(out)))?;
    match dtype {
        DataType::Float32 => column.cast(&DataType::Float32),
        _ => Ok(column),
    }
}
