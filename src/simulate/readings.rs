//! Synthetic water-quality readings.
//!
//! # Bacteria model
//! Bacteria probability is a fresh uniform draw from a range picked by the
//! turbidity tier. The model is deliberately discontinuous at tier edges;
//! exactly 5 and exactly 10 NTU belong to the lower tier.
//!
//!   turbidity <= 5        → [0, 20]
//!   5 < turbidity <= 10   → [20, 50]
//!   turbidity > 10        → [50, 100]
//!
//! Temperature is drawn for display only and never feeds classification.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::model::{Reading, PH_RANGE, TEMPERATURE_RANGE_C, TURBIDITY_RANGE_NTU};
use crate::simulate::random::{random_float, random_int};

// ---------------------------------------------------------------------------
// Bacteria probability
// ---------------------------------------------------------------------------

/// Turbidity tiers of the bacteria probability model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacteriaTier {
    Clear,
    Cloudy,
    Murky,
}

impl BacteriaTier {
    pub fn for_turbidity(turbidity: f64) -> Self {
        if turbidity <= 5.0 {
            BacteriaTier::Clear
        } else if turbidity <= 10.0 {
            BacteriaTier::Cloudy
        } else {
            BacteriaTier::Murky
        }
    }

    /// Inclusive percentage range drawn from for this tier.
    pub fn probability_range(self) -> (u8, u8) {
        match self {
            BacteriaTier::Clear => (0, 20),
            BacteriaTier::Cloudy => (20, 50),
            BacteriaTier::Murky => (50, 100),
        }
    }
}

/// Draws a bacteria contamination probability (percent) for `turbidity`.
pub fn bacteria_probability<R: Rng + ?Sized>(rng: &mut R, turbidity: f64) -> u8 {
    let (lo, hi) = BacteriaTier::for_turbidity(turbidity).probability_range();
    // Range is within 0..=100, so the narrowing cannot truncate.
    random_int(rng, i64::from(lo), i64::from(hi)) as u8
}

// ---------------------------------------------------------------------------
// Reading generation
// ---------------------------------------------------------------------------

/// Generates one classified reading stamped with `id` and `timestamp`.
pub fn generate_reading<R: Rng + ?Sized>(rng: &mut R, id: u64, timestamp: DateTime<Utc>) -> Reading {
    let ph = random_float(rng, PH_RANGE.0, PH_RANGE.1, 2);
    let turbidity = random_float(rng, TURBIDITY_RANGE_NTU.0, TURBIDITY_RANGE_NTU.1, 2);
    let temperature = random_float(rng, TEMPERATURE_RANGE_C.0, TEMPERATURE_RANGE_C.1, 1);
    let bacteria = bacteria_probability(rng, turbidity);
    Reading::classified(id, timestamp, ph, turbidity, temperature, bacteria)
}

/// Generates `count` readings for a new water body's history.
///
/// Readings are spaced `spacing` apart and end at `end`, oldest first. Ids
/// are taken from `next_id` in order.
pub fn seed_readings<R, F>(
    rng: &mut R,
    mut next_id: F,
    count: usize,
    end: DateTime<Utc>,
    spacing: Duration,
) -> Vec<Reading>
where
    R: Rng + ?Sized,
    F: FnMut() -> u64,
{
    (0..count)
        .map(|i| {
            let steps_back = (count - 1 - i) as i32;
            let timestamp = end - spacing * steps_back;
            generate_reading(rng, next_id(), timestamp)
        })
        .collect()
}
