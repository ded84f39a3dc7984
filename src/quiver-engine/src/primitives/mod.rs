//! Algorithmic primitives behind the built-in functions.
//!
//! Each primitive works on evaluated columns; argument evaluation and
//! broadcasting happen in the evaluator.

pub(crate) mod ewm;
pub(crate) mod horizontal;
pub(crate) mod list;
pub(crate) mod map_dict;
pub(crate) mod misc;
pub(crate) mod rank;
pub(crate) mod sample;
pub(crate) mod search_sorted;
pub(crate) mod unique;

pub(crate) use ewm::{ewm, EwmKind};
pub(crate) use horizontal::{fold_skip_nulls, horizontal};
pub(crate) use list::{concat_list, list_contains, list_eval, list_join};
pub(crate) use map_dict::map_dict;
pub(crate) use misc::{concat, cumcount, diff, dot, drop_nulls, log, repeat};
pub(crate) use rank::rank;
pub(crate) use sample::{sample, shuffle};
pub(crate) use search_sorted::search_sorted;
pub(crate) use unique::{unique, unique_counts};
