//! Core data types for the environmental-health monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! water-quality readings, the water bodies that own them, and the public
//! toilet usage counters. It holds the fixed measurement domains as constants
//! so the generators and the tests agree on them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Measurement domains
// ---------------------------------------------------------------------------

/// pH draw range for synthetic readings.
pub const PH_RANGE: (f64, f64) = (6.3, 8.8);

/// Turbidity draw range, in NTU.
pub const TURBIDITY_RANGE_NTU: (f64, f64) = (0.0, 15.0);

/// Water temperature draw range, in °C. Informational only.
pub const TEMPERATURE_RANGE_C: (f64, f64) = (20.0, 35.0);

/// Most recent readings kept per water body.
pub const READING_CAPACITY: usize = 60;

/// Most recent usage samples kept per toilet.
pub const USAGE_CAPACITY: usize = 20;

/// Usage counter resets to zero once it would exceed this value.
pub const USAGE_CEILING: u32 = 200;

/// Largest per-tick usage increment.
pub const MAX_USAGE_STEP: u32 = 5;

/// Readings generated for a newly registered water body.
pub const SEED_READING_COUNT: usize = 12;

/// Display format for reading and sample timestamps.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// Safety status
// ---------------------------------------------------------------------------

/// Overall water-body safety, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SafetyStatus {
    Safe,
    Warning,
    Contaminated,
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyStatus::Safe => write!(f, "Safe"),
            SafetyStatus::Warning => write!(f, "Warning"),
            SafetyStatus::Contaminated => write!(f, "Contaminated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Water quality
// ---------------------------------------------------------------------------

/// A single synthetic water-quality sample.
///
/// The metric fields are private: `Reading::classified` is the only
/// constructor, so `status` always equals
/// `alert::thresholds::classify(ph, turbidity, bacteria_probability)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    ph: f64,
    turbidity: f64,   // NTU
    temperature: f64, // °C
    bacteria_probability: u8, // percent
    status: SafetyStatus,
}

impl Reading {
    /// Builds a reading whose status is classified from the three metrics.
    pub fn classified(
        id: u64,
        timestamp: DateTime<Utc>,
        ph: f64,
        turbidity: f64,
        temperature: f64,
        bacteria_probability: u8,
    ) -> Self {
        let status = crate::alert::thresholds::classify(ph, turbidity, bacteria_probability);
        Reading {
            id,
            timestamp,
            ph,
            turbidity,
            temperature,
            bacteria_probability,
            status,
        }
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    /// Turbidity in NTU.
    pub fn turbidity(&self) -> f64 {
        self.turbidity
    }

    /// Water temperature in °C. Not part of classification.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Bacteria presence probability, in percent.
    pub fn bacteria_probability(&self) -> u8 {
        self.bacteria_probability
    }

    pub fn status(&self) -> SafetyStatus {
        self.status
    }

    /// Timestamp formatted for chart axes and console output.
    pub fn display_time(&self) -> String {
        self.timestamp.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
    }
}

/// A monitored water body and its bounded reading history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterBody {
    pub id: u64,
    pub name: String,
    /// Chronological, oldest first.
    pub readings: Vec<Reading>,
}

impl WaterBody {
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// The most recent reading, if any.
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// Status of the most recent reading; `None` before the first reading.
    pub fn current_status(&self) -> Option<SafetyStatus> {
        self.latest().map(|r| r.status())
    }
}

// ---------------------------------------------------------------------------
// Toilet usage
// ---------------------------------------------------------------------------

/// One point on a toilet's usage chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToiletUsageSample {
    pub timestamp: DateTime<Utc>,
    pub usage: u32,
}

impl ToiletUsageSample {
    pub fn display_time(&self) -> String {
        self.timestamp.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
    }
}

/// A monitored public toilet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toilet {
    pub id: u64,
    pub name: String,
    pub usage: u32,
    /// Chronological, oldest first.
    pub history: Vec<ToiletUsageSample>,
}

impl Toilet {
    /// A freshly installed toilet: zero usage, no history.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Toilet {
            id,
            name: name.into(),
            usage: 0,
            history: Vec::new(),
        }
    }
}
