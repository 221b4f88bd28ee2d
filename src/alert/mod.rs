//! Water safety classification and contamination alerting.
//!
//! Submodules:
//! - `thresholds` — risk score and status classification.
//! - `notify`     — transition events, alert sinks, and the alerter's
//!   readiness state machine.

pub mod notify;
pub mod thresholds;

pub use notify::{AlertReadiness, AlertSink, Alerter, ContaminationEvent, MemorySink, TerminalBell};

use std::fmt;

/// Errors an alert sink can report. These never leave the alerter.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertError {
    /// The sink cannot sound yet (not armed, device unavailable).
    NotReady(String),
    /// The sink was ready but writing the alert failed.
    Io(String),
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertError::NotReady(msg) => write!(f, "Alert sink not ready: {}", msg),
            AlertError::Io(msg) => write!(f, "Alert I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AlertError {}
