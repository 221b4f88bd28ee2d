//! Synthetic data generation.
//!
//! Submodules:
//! - `random`   — bounded float/integer draws and the seedable simulation RNG.
//! - `readings` — bacteria probability model and water-quality readings.
//! - `toilets`  — wrapping usage counters.

pub mod random;
pub mod readings;
pub mod toilets;
