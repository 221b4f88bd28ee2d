//! Bounded random value generators.
//!
//! All generators take the RNG explicitly so the registry can drive them from
//! a seeded `ChaCha8Rng` and tests can replay exact sequences.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Builds the simulation RNG: deterministic when a seed is given, otherwise
/// seeded from OS entropy.
pub fn sim_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Uniform real in `[min, max]`, rounded to `decimals` places.
///
/// Bounds given in the wrong order are swapped.
pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, decimals: u32) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let raw = if lo == hi { lo } else { rng.gen_range(lo..=hi) };
    let factor = 10f64.powi(decimals as i32);
    ((raw * factor).round() / factor).clamp(lo, hi)
}

/// Uniform integer in `[min, max]`, inclusive at both ends.
///
/// Bounds given in the wrong order are swapped.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(lo..=hi)
}
