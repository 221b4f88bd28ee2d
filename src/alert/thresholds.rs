//! Water safety threshold checking.
//!
//! Combines pH, turbidity and bacteria probability into an integer risk
//! score and maps the score onto a `SafetyStatus`. Bacterial risk counts
//! double. Everything here is pure so it can be tested with fixed inputs.

use crate::model::SafetyStatus;

/// Lower edge of the potable pH band.
pub const PH_MIN_POTABLE: f64 = 6.5;

/// Upper edge of the potable pH band.
pub const PH_MAX_POTABLE: f64 = 8.5;

/// Turbidity above this many NTU counts against the water body.
pub const TURBIDITY_LIMIT_NTU: f64 = 5.0;

/// Bacteria probability above this percentage counts double.
pub const BACTERIA_LIMIT_PCT: u8 = 20;

/// Highest score `safety_score` can return.
pub const MAX_SCORE: u8 = 4;

/// Computes the risk score for one set of measurements.
///
///   +1  pH outside [6.5, 8.5]
///   +1  turbidity > 5 NTU
///   +2  bacteria probability > 20 %
pub fn safety_score(ph: f64, turbidity: f64, bacteria_probability: u8) -> u8 {
    let mut score = 0;
    if ph < PH_MIN_POTABLE || ph > PH_MAX_POTABLE {
        score += 1;
    }
    if turbidity > TURBIDITY_LIMIT_NTU {
        score += 1;
    }
    if bacteria_probability > BACTERIA_LIMIT_PCT {
        score += 2;
    }
    score
}

/// Maps a risk score onto a status: 0–1 Safe, 2 Warning, 3+ Contaminated.
pub fn status_for_score(score: u8) -> SafetyStatus {
    match score {
        0 | 1 => SafetyStatus::Safe,
        2 => SafetyStatus::Warning,
        _ => SafetyStatus::Contaminated,
    }
}

/// Classifies one set of measurements.
pub fn classify(ph: f64, turbidity: f64, bacteria_probability: u8) -> SafetyStatus {
    status_for_score(safety_score(ph, turbidity, bacteria_probability))
}
