//! Service configuration.
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) yields a runnable two-lake, two-toilet simulation.
//!
//! ```toml
//! [simulation]
//! tick_interval_secs = 2
//! seed = 42
//!
//! [logging]
//! level = "debug"
//!
//! [[water_bodies]]
//! name = "Riverside Reservoir"
//!
//! [[toilets]]
//! name = "Central Park"
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogLevel;
use crate::model::{
    MAX_USAGE_STEP, READING_CAPACITY, SEED_READING_COUNT, USAGE_CAPACITY, USAGE_CEILING,
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "HEALTHMON_CONFIG";

/// Environment variable overriding `logging.file`.
pub const LOG_FILE_ENV: &str = "HEALTHMON_LOG_FILE";

/// Config file used when `HEALTHMON_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "healthmon.toml";

/// Longest accepted tick interval (one day).
pub const MAX_TICK_INTERVAL_SECS: u64 = 86_400;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when loading or validating configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Io(String),
    /// The file is not valid TOML or does not match the expected shape.
    Parse(String),
    /// A value parsed but is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Config source
// ---------------------------------------------------------------------------

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file was missing; built-in defaults are in use.
    Defaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "Loaded {}", path.display()),
            ConfigSource::Defaults(path) => {
                write!(f, "Config file {} not found, using defaults", path.display())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

/// Simulation timing, buffer sizes and usage limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_secs: u64,
    /// Readings generated when a water body is registered.
    pub seed_readings: usize,
    pub reading_capacity: usize,
    pub usage_capacity: usize,
    pub usage_ceiling: u32,
    pub max_usage_step: u32,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_interval_secs: 2,
            seed_readings: SEED_READING_COUNT,
            reading_capacity: READING_CAPACITY,
            usage_capacity: USAGE_CAPACITY,
            usage_ceiling: USAGE_CEILING,
            max_usage_step: MAX_USAGE_STEP,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

/// A water body or toilet registered at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteConfig {
    pub name: String,
}

impl SiteConfig {
    fn named(name: &str) -> Self {
        SiteConfig { name: name.to_string() }
    }
}

fn default_water_bodies() -> Vec<SiteConfig> {
    vec![SiteConfig::named("Riverside Reservoir"), SiteConfig::named("Mill Creek")]
}

fn default_toilets() -> Vec<SiteConfig> {
    vec![SiteConfig::named("Central Park"), SiteConfig::named("Market Square")]
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_water_bodies")]
    pub water_bodies: Vec<SiteConfig>,
    #[serde(default = "default_toilets")]
    pub toilets: Vec<SiteConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
            water_bodies: default_water_bodies(),
            toilets: default_toilets(),
        }
    }
}

impl MonitorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// Like `load`, also reporting whether the file or the defaults were used.
    pub fn load_with_source(path: impl AsRef<Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((MonitorConfig::default(), ConfigSource::Defaults(path.to_path_buf())));
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&contents)?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Loads from `HEALTHMON_CONFIG` (or `healthmon.toml`), then applies
    /// `HEALTHMON_LOG_FILE` if set. Call `dotenv` first to pick up `.env`.
    pub fn from_env() -> Result<(Self, ConfigSource), ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let (mut config, source) = Self::load_with_source(&path)?;
        if let Ok(log_file) = std::env::var(LOG_FILE_ENV) {
            config.logging.file = Some(log_file);
        }
        Ok((config, source))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.tick_interval_secs == 0 || sim.tick_interval_secs > MAX_TICK_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_secs must be between 1 and {}",
                MAX_TICK_INTERVAL_SECS
            )));
        }
        if sim.reading_capacity == 0 {
            return Err(ConfigError::Invalid("reading_capacity must be > 0".into()));
        }
        if sim.usage_capacity == 0 {
            return Err(ConfigError::Invalid("usage_capacity must be > 0".into()));
        }
        if sim.seed_readings > sim.reading_capacity {
            return Err(ConfigError::Invalid(format!(
                "seed_readings ({}) exceeds reading_capacity ({})",
                sim.seed_readings, sim.reading_capacity
            )));
        }
        if let Some(site) = self
            .water_bodies
            .iter()
            .chain(self.toilets.iter())
            .find(|s| s.name.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!("site name {:?} is blank", site.name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = MonitorConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.simulation.reading_capacity, 60);
        assert_eq!(config.simulation.usage_capacity, 20);
        assert_eq!(config.simulation.usage_ceiling, 200);
        assert_eq!(config.simulation.seed_readings, 12);
        assert_eq!(config.water_bodies.len(), 2);
        assert_eq!(config.toilets.len(), 2);
    }

    #[test]
    fn test_full_document_parses() {
        let doc = r#"
            [simulation]
            tick_interval_secs = 5
            seed = 42

            [logging]
            level = "warn"
            file = "healthmon.log"

            [[water_bodies]]
            name = "Lake Ona"

            [[toilets]]
            name = "Harbour Front"
            [[toilets]]
            name = "Bus Terminal"
        "#;
        let config = MonitorConfig::from_toml_str(doc).expect("document should parse");
        assert_eq!(config.simulation.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.simulation.reading_capacity, 60, "unset fields keep defaults");
        assert_eq!(config.logging.level, LogLevel::Warning);
        assert_eq!(config.logging.file.as_deref(), Some("healthmon.log"));
        assert_eq!(config.water_bodies, vec![SiteConfig::named("Lake Ona")]);
        assert_eq!(config.toilets.len(), 2);
    }

    #[test]
    fn test_explicitly_empty_site_lists_are_kept() {
        let doc = "water_bodies = []\ntoilets = []\n";
        let config = MonitorConfig::from_toml_str(doc).expect("document should parse");
        assert!(config.water_bodies.is_empty());
        assert!(config.toilets.is_empty());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = MonitorConfig::from_toml_str("[simulation]\ntick_interval_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))), "got {:?}", result);
    }

    #[test]
    fn test_interval_longer_than_a_day_is_rejected() {
        let result = MonitorConfig::from_toml_str("[simulation]\ntick_interval_secs = 90000\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))), "got {:?}", result);
    }

    #[test]
    fn test_seed_batch_larger_than_capacity_is_rejected() {
        let doc = "[simulation]\nseed_readings = 80\n";
        assert!(matches!(MonitorConfig::from_toml_str(doc), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_blank_site_name_is_rejected() {
        let doc = "[[toilets]]\nname = \"  \"\n";
        assert!(matches!(MonitorConfig::from_toml_str(doc), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = MonitorConfig::from_toml_str("[simulation\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))), "got {:?}", result);
    }

    #[test]
    fn test_unknown_log_level_is_parse_error() {
        let result = MonitorConfig::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = MonitorConfig::load("/nonexistent/path/healthmon.toml")
            .expect("missing file should not be an error");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_missing_file_reports_defaults_source() {
        let (_, source) = MonitorConfig::load_with_source("/nonexistent/path/healthmon.toml")
            .expect("missing file should not be an error");
        assert_eq!(
            source.to_string(),
            "Config file /nonexistent/path/healthmon.toml not found, using defaults"
        );
    }

    #[test]
    fn test_existing_file_reports_file_source() {
        let path = std::env::temp_dir().join(format!("healthmon_config_{}.toml", std::process::id()));
        std::fs::write(&path, "[simulation]\ntick_interval_secs = 7\n").unwrap();
        let result = MonitorConfig::load_with_source(&path);
        std::fs::remove_file(&path).unwrap();

        let (config, source) = result.expect("file should load");
        assert_eq!(config.simulation.tick_interval_secs, 7);
        assert_eq!(source, ConfigSource::File(path.clone()));
        assert_eq!(source.to_string(), format!("Loaded {}", path.display()));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("reading_capacity must be > 0".into());
        assert_eq!(err.to_string(), "Invalid config: reading_capacity must be > 0");
    }
}
