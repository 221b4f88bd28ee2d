//! Periodic simulation driver.
//!
//! A `Monitor` owns the registry and the alerter. `start` spawns the timer
//! thread that ticks the registry every interval and hands any contamination
//! events to the alerter. Only one timer may drive a monitor (and its clones)
//! at a time; a second `start` fails with `MonitorError::AlreadyRunning`.
//! The returned `MonitorHandle` stops the thread on `stop()` or on drop; once
//! `stop()` returns no further tick runs.
//!
//! A tick holds the registry write lock only while the new entity records
//! are swapped in. Alerts are delivered after the lock is released.

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::alert::{AlertSink, Alerter};
use crate::config::MonitorConfig;
use crate::logging::{self, Component};
use crate::registry::{Registry, RegistrySnapshot, TickReport};

// Poisoning only means another thread panicked mid-operation; every
// registry mutation is a whole-record swap, so the data is still consistent.

fn read_registry(registry: &RwLock<Registry>) -> RwLockReadGuard<'_, Registry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_registry(registry: &RwLock<Registry>) -> RwLockWriteGuard<'_, Registry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock_alerter(alerter: &Mutex<Alerter>) -> MutexGuard<'_, Alerter> {
    alerter.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// A timer thread is already driving this monitor.
    AlreadyRunning,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::AlreadyRunning => write!(f, "Monitor is already running"),
        }
    }
}

impl std::error::Error for MonitorError {}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Shared simulation state plus the interval it is driven at.
#[derive(Clone)]
pub struct Monitor {
    registry: Arc<RwLock<Registry>>,
    alerter: Arc<Mutex<Alerter>>,
    interval: Duration,
    /// Set while a timer thread owns this monitor. Shared by clones.
    running: Arc<AtomicBool>,
}

impl Monitor {
    pub fn new(registry: Registry, alerter: Alerter, interval: Duration) -> Self {
        Monitor {
            registry: Arc::new(RwLock::new(registry)),
            alerter: Arc::new(Mutex::new(alerter)),
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds the registry from `config` and wires alerts to `sink`.
    pub fn from_config(config: &MonitorConfig, sink: Box<dyn AlertSink>) -> Self {
        let registry = Registry::from_config(config, Utc::now());
        Monitor::new(registry, Alerter::new(sink), config.simulation.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn registry(&self) -> Arc<RwLock<Registry>> {
        Arc::clone(&self.registry)
    }

    pub fn alerter(&self) -> Arc<Mutex<Alerter>> {
        Arc::clone(&self.alerter)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        read_registry(&self.registry).snapshot()
    }

    /// Whether a timer thread currently drives this monitor.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Records the user interaction that enables audible alerts.
    pub fn arm_alerts(&self) {
        lock_alerter(&self.alerter).arm();
    }

    /// Runs one tick synchronously and delivers its alerts.
    pub fn tick_once(&self) -> TickReport {
        let report = write_registry(&self.registry).tick(Utc::now());
        if !report.events.is_empty() {
            lock_alerter(&self.alerter).notify_all(&report.events);
        }
        report
    }

    /// Starts the timer thread.
    pub fn start(&self) -> Result<MonitorHandle, MonitorError> {
        self.start_with(|_, _| {})
    }

    /// Starts the timer thread, calling `on_tick` after every tick with the
    /// tick's report and a fresh snapshot.
    pub fn start_with<F>(&self, mut on_tick: F) -> Result<MonitorHandle, MonitorError>
    where
        F: FnMut(&TickReport, &RegistrySnapshot) + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            logging::warn(Component::System, None, "Monitor already running; start ignored");
            return Err(MonitorError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let monitor = self.clone();

        let thread = thread::spawn(move || {
            logging::info(
                Component::System,
                None,
                &format!("Monitor started, ticking every {:?}", monitor.interval),
            );
            loop {
                match stop_rx.recv_timeout(monitor.interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let report = monitor.tick_once();
                        on_tick(&report, &monitor.snapshot());
                    }
                    // Explicit stop, or the handle was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            logging::info(Component::System, None, "Monitor stopped");
        });

        Ok(MonitorHandle {
            monitor: self.clone(),
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A running monitor. Dropping the handle stops the timer thread.
pub struct MonitorHandle {
    monitor: Monitor,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.monitor.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the timer thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The thread may already be gone; nothing to signal then.
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                logging::error(Component::System, None, "Monitor thread panicked");
            }
            self.monitor.running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
