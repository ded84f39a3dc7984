//! Seeded random row selection.

use common_error::{QuiverError, QuiverResult};
use log::debug;
use quiver_core::Column;
use quiver_logical::expr::SampleOptions;
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::executor::RandomSource;

/// Draw rows from `input`. Rows are returned in draw order.
pub(crate) fn sample(
    input: &Column,
    options: SampleOptions,
    random: &RandomSource,
) -> QuiverResult<Column> {
    let len = input.len();
    let n = options.resolve(len)?;
    let (mut rng, seed) = random.generator(options.seed)?;
    debug!(
        "sample of {n} from {len} rows of '{}' (replacement={}, seed={seed})",
        input.name(),
        options.with_replacement
    );
    let rows: Vec<usize> = if options.with_replacement {
        if len == 0 && n > 0 {
            return Err(QuiverError::invalid_parameter(
                "cannot sample with replacement from an empty input",
            ));
        }
        (0..n).map(|_| rng.gen_range(0..len)).collect()
    } else {
        index::sample(&mut rng, len, n).into_vec()
    };
    input.take(&to_indices(rows)?)
}

/// Random permutation of all rows.
pub(crate) fn shuffle(
    input: &Column,
    seed: Option<u64>,
    random: &RandomSource,
) -> QuiverResult<Column> {
    let (mut rng, seed) = random.generator(seed)?;
    debug!("shuffle of {} rows of '{}' (seed={seed})", input.len(), input.name());
    let mut rows: Vec<usize> = (0..input.len()).collect();
    rows.shuffle(&mut rng);
    input.take(&to_indices(rows)?)
}

fn to_indices(rows: Vec<usize>) -> QuiverResult<Vec<u32>> {
    rows.into_iter()
        .map(|r| {
            u32::try_from(r).map_err(|_| QuiverError::compute("row index exceeds UInt32 range"))
        })
        .collect()
}
