//! Explicit random source for seeded primitives.

use std::sync::Mutex;

use common_error::{QuiverError, QuiverResult};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Shared generator from which unseeded `sample`/`shuffle` calls draw their seed.
///
/// Every invocation builds its own [`StdRng`]; the shared generator is only
/// touched once per invocation to derive that generator's seed. Reseeding the
/// source makes the following sequence of unseeded calls reproducible.
#[derive(Debug)]
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Create a source seeded with `seed`, or from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Reset the shared generator.
    pub fn reseed(&self, seed: u64) -> QuiverResult<()> {
        *self.lock()? = StdRng::seed_from_u64(seed);
        Ok(())
    }

    /// Seed for one invocation: `explicit` if given, otherwise the next draw.
    pub fn seed_for(&self, explicit: Option<u64>) -> QuiverResult<u64> {
        match explicit {
            Some(seed) => Ok(seed),
            None => Ok(self.lock()?.next_u64()),
        }
    }

    /// Independent generator for one invocation.
    pub fn generator(&self, explicit: Option<u64>) -> QuiverResult<(StdRng, u64)> {
        let seed = self.seed_for(explicit)?;
        Ok((StdRng::seed_from_u64(seed), seed))
    }

    /// Source for task `index` of a parallel section seeded with `base`.
    ///
    /// Groups and list cells each get their own source, so the draws of one
    /// task never depend on the order in which workers reach the shared lock.
    pub fn derived(base: u64, index: usize) -> Self {
        Self::new(Some(splitmix64(base ^ splitmix64(index as u64))))
    }

    fn lock(&self) -> QuiverResult<std::sync::MutexGuard<'_, StdRng>> {
        self.rng
            .lock()
            .map_err(|_| QuiverError::internal("random source lock poisoned"))
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(None)
    }
}
