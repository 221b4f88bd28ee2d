//! Structured logging for the health monitoring service
//!
//! Provides context-rich logging with component and entity identifiers,
//! timestamps, and severity levels. Supports both console output
//! and file-based logging for long-running simulation sessions.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Which part of the service a log line comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    WaterBody,
    Toilet,
    Alert,
    Config,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::WaterBody => write!(f, "WATER"),
            Component::Toilet => write!(f, "TOILET"),
            Component::Alert => write!(f, "ALERT"),
            Component::Config => write!(f, "CONFIG"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. the alert sink has not been enabled yet
    Expected,
    /// Unexpected failure - the sink was ready but still failed
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

fn global() -> MutexGuard<'static, Option<Logger>> {
    // A panic mid-log leaves nothing half-written worth protecting.
    LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *global() = Some(logger);
    }

    fn format_entry(level: LogLevel, component: &Component, entity_id: Option<u64>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let entity_part = entity_id.map(|id| format!(" [#{}]", id)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, entity_part, message)
    }

    fn log(&self, level: LogLevel, component: &Component, entity_id: Option<u64>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, entity_id, message);
        let entity_part = entity_id.map(|id| format!(" [#{}]", id)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, entity_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, entity_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(component: Component, entity_id: Option<u64>, message: &str) {
    if let Some(logger) = global().as_ref() {
        logger.log(LogLevel::Info, &component, entity_id, message);
    }
}

/// Log a warning message
pub fn warn(component: Component, entity_id: Option<u64>, message: &str) {
    if let Some(logger) = global().as_ref() {
        logger.log(LogLevel::Warning, &component, entity_id, message);
    }
}

/// Log an error message
pub fn error(component: Component, entity_id: Option<u64>, message: &str) {
    if let Some(logger) = global().as_ref() {
        logger.log(LogLevel::Error, &component, entity_id, message);
    }
}

/// Log a debug message
pub fn debug(component: Component, entity_id: Option<u64>, message: &str) {
    if let Some(logger) = global().as_ref() {
        logger.log(LogLevel::Debug, &component, entity_id, message);
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Classify an alert sink failure from its error
pub fn classify_alert_failure(err: &crate::alert::AlertError) -> FailureType {
    match err {
        crate::alert::AlertError::NotReady(_) => FailureType::Expected,
        crate::alert::AlertError::Io(_) => FailureType::Unexpected,
    }
}

/// Log an alert delivery failure with classification.
///
/// Expected failures go to debug so a muted sink does not flood the console.
pub fn log_alert_failure(water_body_id: u64, operation: &str, err: &crate::alert::AlertError) {
    let failure_type = classify_alert_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(Component::Alert, Some(water_body_id), &message),
        FailureType::Unexpected => warn(Component::Alert, Some(water_body_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Tick Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one simulation tick
pub fn log_tick_summary(tick: u64, water_bodies: usize, toilets: usize, newly_contaminated: usize) {
    let message = format!(
        "Tick {}: {} water bodies, {} toilets updated, {} newly contaminated",
        tick, water_bodies, toilets, newly_contaminated
    );

    if newly_contaminated == 0 {
        debug(Component::System, None, &message);
    } else {
        info(Component::System, None, &message);
    }
}
