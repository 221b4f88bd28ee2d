//! Public toilet usage simulation.
//!
//! Usage is a counter that grows by a small random step each tick and resets
//! to zero once it passes the ceiling (an end-of-day reset, not a clamp).

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::analysis::history::append_bounded;
use crate::model::{Toilet, ToiletUsageSample};
use crate::simulate::random::random_int;

/// Applies one increment, wrapping to zero when the result exceeds `ceiling`.
pub fn next_usage(current: u32, delta: u32, ceiling: u32) -> u32 {
    let next = current.saturating_add(delta);
    if next > ceiling { 0 } else { next }
}

/// Parameters for a usage tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    pub max_step: u32,
    pub ceiling: u32,
    pub capacity: usize,
}

impl Default for UsageLimits {
    fn default() -> Self {
        UsageLimits {
            max_step: crate::model::MAX_USAGE_STEP,
            ceiling: crate::model::USAGE_CEILING,
            capacity: crate::model::USAGE_CAPACITY,
        }
    }
}

/// Returns the toilet as it stands after one tick. `toilet` is not modified.
pub fn advance_toilet<R: Rng + ?Sized>(
    rng: &mut R,
    toilet: &Toilet,
    now: DateTime<Utc>,
    limits: UsageLimits,
) -> Toilet {
    // max_step is a u32, so the draw is non-negative and fits back.
    let delta = random_int(rng, 0, i64::from(limits.max_step)) as u32;
    advance_toilet_by(toilet, delta, now, limits)
}

/// Deterministic core of `advance_toilet`.
pub fn advance_toilet_by(
    toilet: &Toilet,
    delta: u32,
    now: DateTime<Utc>,
    limits: UsageLimits,
) -> Toilet {
    let usage = next_usage(toilet.usage, delta, limits.ceiling);
    let sample = ToiletUsageSample { timestamp: now, usage };
    Toilet {
        id: toilet.id,
        name: toilet.name.clone(),
        usage,
        history: append_bounded(&toilet.history, sample, limits.capacity),
    }
}
