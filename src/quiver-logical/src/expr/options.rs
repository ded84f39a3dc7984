//! Parameter structs carried by expression nodes.
//!
//! Every constructor validates its input so that invalid parameters surface as
//! `InvalidParameter` before any evaluation starts.

use std::str::FromStr;

use common_error::{param_err, QuiverError, QuiverResult};
use serde::{Deserialize, Serialize};

/// Tie-break method for `rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RankMethod {
    /// Mean of the ordinal ranks a tie spans.
    #[default]
    Average,
    /// Lowest ordinal rank of the tie.
    Min,
    /// Highest ordinal rank of the tie.
    Max,
    /// Ties share a rank; the next distinct value gets the next integer.
    Dense,
    /// Distinct ranks in order of appearance.
    Ordinal,
}

impl RankMethod {
    /// Method name as accepted by [`RankMethod::from_str`].
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
            Self::Dense => "dense",
            Self::Ordinal => "ordinal",
        }
    }
}

impl FromStr for RankMethod {
    type Err = QuiverError;

    fn from_str(s: &str) -> QuiverResult<Self> {
        match s {
            "average" => Ok(Self::Average),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "dense" => Ok(Self::Dense),
            "ordinal" => Ok(Self::Ordinal),
            other => param_err!(
                "unknown rank method '{other}', expected one of average, min, max, dense, ordinal"
            ),
        }
    }
}

/// Options for `rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RankOptions {
    /// Tie-break method.
    pub method: RankMethod,
    /// Rank the largest value first.
    pub descending: bool,
}

/// Which insertion point `search_sorted` reports for equal elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchSortedSide {
    /// Before any equal elements.
    #[default]
    Left,
    /// After all equal elements.
    Right,
}

impl FromStr for SearchSortedSide {
    type Err = QuiverError;

    fn from_str(s: &str) -> QuiverResult<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => param_err!("unknown search side '{other}', expected left or right"),
        }
    }
}

/// Options for exponentially weighted statistics.
///
/// The decay is stored as `alpha`; `com`, `span` and `half_life` are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EwmOptions {
    /// Smoothing factor in `(0, 1]`.
    pub alpha: f64,
    /// Divide by the decaying sum of weights instead of using the recursive form.
    pub adjust: bool,
    /// Use the biased variance estimate.
    pub bias: bool,
    /// Minimum number of observations before a value is produced.
    pub min_periods: usize,
    /// Compute weights from observations only, ignoring null positions.
    pub ignore_nulls: bool,
}

impl EwmOptions {
    /// Decay given directly as the smoothing factor.
    pub fn from_alpha(alpha: f64) -> QuiverResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            param_err!("alpha must satisfy 0 < alpha <= 1, got {alpha}");
        }
        Ok(Self {
            alpha,
            adjust: true,
            bias: false,
            min_periods: 1,
            ignore_nulls: true,
        })
    }

    /// Decay given as center of mass: `alpha = 1 / (1 + com)`.
    pub fn from_com(com: f64) -> QuiverResult<Self> {
        if !(com >= 0.0) {
            param_err!("com must be >= 0, got {com}");
        }
        Self::from_alpha(1.0 / (1.0 + com))
    }

    /// Decay given as span: `alpha = 2 / (span + 1)`.
    pub fn from_span(span: f64) -> QuiverResult<Self> {
        if !(span >= 1.0) {
            param_err!("span must be >= 1, got {span}");
        }
        Self::from_alpha(2.0 / (span + 1.0))
    }

    /// Decay given as half-life: `alpha = 1 - exp(-ln(2) / half_life)`.
    pub fn from_half_life(half_life: f64) -> QuiverResult<Self> {
        if !(half_life > 0.0) {
            param_err!("half_life must be > 0, got {half_life}");
        }
        Self::from_alpha(1.0 - (-std::f64::consts::LN_2 / half_life).exp())
    }

    /// Check parameters that may have been set directly on the public fields.
    pub fn validate(&self) -> QuiverResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            param_err!("alpha must satisfy 0 < alpha <= 1, got {}", self.alpha);
        }
        Ok(())
    }

    /// Center of mass equivalent to `alpha`.
    pub fn com(&self) -> f64 {
        1.0 / self.alpha - 1.0
    }

    /// Span equivalent to `alpha`.
    pub fn span(&self) -> f64 {
        2.0 / self.alpha - 1.0
    }

    /// Half-life equivalent to `alpha`; zero when `alpha == 1`.
    pub fn half_life(&self) -> f64 {
        if self.alpha >= 1.0 {
            0.0
        } else {
            -std::f64::consts::LN_2 / (1.0 - self.alpha).ln()
        }
    }

    /// Set `adjust`.
    #[must_use]
    pub const fn with_adjust(mut self, adjust: bool) -> Self {
        self.adjust = adjust;
        self
    }

    /// Set `bias`.
    #[must_use]
    pub const fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set `min_periods`.
    #[must_use]
    pub const fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }

    /// Set `ignore_nulls`.
    #[must_use]
    pub const fn with_ignore_nulls(mut self, ignore_nulls: bool) -> Self {
        self.ignore_nulls = ignore_nulls;
        self
    }
}

/// How many rows `sample` draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleSize {
    /// An exact count.
    N(i64),
    /// A fraction of the input length.
    Frac(f64),
}

/// Options for `sample`. Drawn rows are returned in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Number or fraction of rows.
    pub size: SampleSize,
    /// Allow the same row to be drawn more than once.
    pub with_replacement: bool,
    /// Fixed seed; `None` draws from the context's random source.
    pub seed: Option<u64>,
}

impl SampleOptions {
    /// Sample exactly `n` rows.
    pub fn n(n: i64) -> Self {
        Self {
            size: SampleSize::N(n),
            with_replacement: false,
            seed: None,
        }
    }

    /// Sample `fraction` of the rows.
    pub fn frac(fraction: f64) -> Self {
        Self {
            size: SampleSize::Frac(fraction),
            ..Self::n(0)
        }
    }

    /// Set `with_replacement`.
    #[must_use]
    pub const fn with_replacement(mut self, with_replacement: bool) -> Self {
        self.with_replacement = with_replacement;
        self
    }

    /// Set a fixed seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Check the parameters that do not depend on the input.
    pub fn validate(&self) -> QuiverResult<()> {
        match self.size {
            SampleSize::N(n) if n < 0 => param_err!("sample size must be non-negative, got {n}"),
            SampleSize::Frac(f) if !(f >= 0.0) => {
                param_err!("sample fraction must be non-negative, got {f}")
            }
            SampleSize::Frac(f) if f > 1.0 && !self.with_replacement => {
                param_err!("sample fraction {f} > 1 requires with_replacement")
            }
            _ => Ok(()),
        }
    }

    /// Number of rows to draw from an input of `len` rows.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn resolve(&self, len: usize) -> QuiverResult<usize> {
        self.validate()?;
        let n = match self.size {
            SampleSize::N(n) => usize::try_from(n)
                .map_err(|_| QuiverError::invalid_parameter(format!("sample size {n} too large")))?,
            SampleSize::Frac(f) => (f * len as f64) as usize,
        };
        if n > len && !self.with_replacement {
            param_err!(
                "cannot take a larger sample ({n}) than the population ({len}) without replacement"
            );
        }
        Ok(n)
    }
}

/// Rewrite applied to an expression's output name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameMapping {
    /// Prepend a string.
    Prefix(String),
    /// Append a string.
    Suffix(String),
    /// Replace with a template; `{name}` is substituted with the original name.
    Template(String),
    /// Upper-case the name.
    Uppercase,
    /// Lower-case the name.
    Lowercase,
}

impl NameMapping {
    /// Apply the mapping to `name`.
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Prefix(p) => format!("{p}{name}"),
            Self::Suffix(s) => format!("{name}{s}"),
            Self::Template(t) => t.replace("{name}", name),
            Self::Uppercase => name.to_uppercase(),
            Self::Lowercase => name.to_lowercase(),
        }
    }
}
