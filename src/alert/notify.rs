//! Contamination notifications.
//!
//! The engine only emits `ContaminationEvent`s: one per water body per tick
//! in which the status crosses into Contaminated from anything else. Whether
//! an event becomes an audible alert is decided here by the `Alerter`, which
//! moves through three readiness states:
//!
//!   Uninitialized ──arm()──▶ Armed ──sink.prepare() ok──▶ Active
//!
//! `arm()` stands in for the first user interaction. Events arriving before
//! it are dropped. The sink is prepared lazily on the first event after
//! arming; if that fails the alerter stays Armed and retries next time.
//! Sink failures are logged and swallowed so a tick is never interrupted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use super::AlertError;
use crate::logging::{self, Component};
use crate::model::{Reading, SafetyStatus, WaterBody};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A water body whose latest reading newly classified as Contaminated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContaminationEvent {
    pub water_body_id: u64,
    pub water_body_name: String,
    pub reading_id: u64,
    pub timestamp: DateTime<Utc>,
    pub previous_status: Option<SafetyStatus>,
}

/// True only when `current` is Contaminated and `previous` was not. No
/// previous reading counts as not contaminated.
pub fn is_contamination_transition(previous: Option<SafetyStatus>, current: SafetyStatus) -> bool {
    current == SafetyStatus::Contaminated && previous != Some(SafetyStatus::Contaminated)
}

/// Compares `reading` against the water body's latest reading before it is
/// appended.
pub fn detect_transition(before: &WaterBody, reading: &Reading) -> Option<ContaminationEvent> {
    let previous_status = before.current_status();
    if !is_contamination_transition(previous_status, reading.status()) {
        return None;
    }
    Some(ContaminationEvent {
        water_body_id: before.id,
        water_body_name: before.name.clone(),
        reading_id: reading.id,
        timestamp: reading.timestamp,
        previous_status,
    })
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Something that can make an alert noticeable: a speaker, a terminal bell,
/// a pager.
pub trait AlertSink: Send {
    /// Acquire whatever the sink needs before it can sound. Called once,
    /// on the first event after the alerter is armed.
    fn prepare(&mut self) -> Result<(), AlertError> {
        Ok(())
    }

    fn sound(&mut self, event: &ContaminationEvent) -> Result<(), AlertError>;
}

/// Rings the terminal bell and prints a one-line notice.
pub struct TerminalBell<W: Write + Send> {
    out: W,
}

impl TerminalBell<std::io::Stdout> {
    pub fn stdout() -> Self {
        TerminalBell { out: std::io::stdout() }
    }
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        TerminalBell { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> AlertSink for TerminalBell<W> {
    fn sound(&mut self, event: &ContaminationEvent) -> Result<(), AlertError> {
        writeln!(
            self.out,
            "\x07🚨 {} is now CONTAMINATED (reading #{} at {})",
            event.water_body_name,
            event.reading_id,
            event.timestamp.format(crate::model::TIMESTAMP_DISPLAY_FORMAT)
        )
        .and_then(|_| self.out.flush())
        .map_err(|e| AlertError::Io(e.to_string()))
    }
}

/// Collects events in memory. Clones share the same buffer, so a UI or a
/// test can keep one handle while the alerter owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ContaminationEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ContaminationEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AlertSink for MemorySink {
    fn sound(&mut self, event: &ContaminationEvent) -> Result<(), AlertError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Alerter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertReadiness {
    /// No user interaction yet; events are dropped.
    Uninitialized,
    /// Enabled, sink not yet prepared.
    Armed,
    /// Sink prepared; events are sounded.
    Active,
}

pub struct Alerter {
    readiness: AlertReadiness,
    sink: Box<dyn AlertSink>,
    sounded: u64,
    dropped: u64,
}

impl Alerter {
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Alerter {
            readiness: AlertReadiness::Uninitialized,
            sink,
            sounded: 0,
            dropped: 0,
        }
    }

    pub fn readiness(&self) -> AlertReadiness {
        self.readiness
    }

    /// Number of events that reached the sink successfully.
    pub fn sounded(&self) -> u64 {
        self.sounded
    }

    /// Number of events dropped or failed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Records the user interaction that permits alerts. Has no effect once
    /// armed or active.
    pub fn arm(&mut self) {
        if self.readiness == AlertReadiness::Uninitialized {
            self.readiness = AlertReadiness::Armed;
            logging::info(Component::Alert, None, "Contamination alerts armed");
        }
    }

    /// Delivers one event. Returns whether the sink sounded it; failures are
    /// logged and otherwise ignored.
    pub fn notify(&mut self, event: &ContaminationEvent) -> bool {
        if self.readiness == AlertReadiness::Uninitialized {
            let err = AlertError::NotReady("alerter not armed".to_string());
            logging::log_alert_failure(event.water_body_id, "Contamination alert", &err);
            self.dropped += 1;
            return false;
        }

        if self.readiness == AlertReadiness::Armed {
            if let Err(err) = self.sink.prepare() {
                logging::log_alert_failure(event.water_body_id, "Alert sink prepare", &err);
                self.dropped += 1;
                return false;
            }
            self.readiness = AlertReadiness::Active;
            logging::debug(Component::Alert, None, "Alert sink active");
        }

        match self.sink.sound(event) {
            Ok(()) => {
                self.sounded += 1;
                true
            }
            Err(err) => {
                logging::log_alert_failure(event.water_body_id, "Contamination alert", &err);
                self.dropped += 1;
                false
            }
        }
    }

    /// Delivers every event in order; returns how many sounded.
    pub fn notify_all(&mut self, events: &[ContaminationEvent]) -> usize {
        events.iter().filter(|e| self.notify(e)).count()
    }
}
