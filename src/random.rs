//! Functions and structs related to RNG and mutation probabilities.
//!
//! Unlike the rest of the evolutionary loop, this module has no notion of what it is being
//! rolled for — it only turns whole percentages into probabilities and seeds into generators.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Turn a whole percent into an `f64` in `[0, 1]`, so call sites read as percentages rather than
/// bare fractions — matches how the mutation thresholds are documented in [`crate::constants`].
pub const fn percent(x: u32) -> f64 {
    x as f64 / 100.
}

/// Roll `true` with probability `p`.
#[inline]
pub fn roll(rng: &mut impl RngCore, p: f64) -> bool {
    rng.random::<f64>() < p
}

/// Build a deterministic RNG from a seed. Single-threaded runs with the same seed are expected
/// to reproduce bit-for-bit; this is the only generator the evolutionary loop uses internally,
/// since reproducibility is only promised single-threaded (see the crate's concurrency notes).
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Seed an RNG from OS entropy, for runs that don't care about reproducibility.
pub fn default_rng() -> StdRng {
    StdRng::from_os_rng()
}

/// Draw a uniform value in `[-extremum, extremum]`. `extremum <= 0` always yields `0`.
#[inline]
pub fn uniform_signed(rng: &mut impl RngCore, extremum: f32) -> f32 {
    if extremum <= 0. {
        return 0.;
    }
    rng.random_range(-extremum..=extremum)
}
