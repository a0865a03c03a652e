//! Service configuration.
//!
//! Read from a TOML file (every section optional), then overridden from the
//! environment after `dotenv` has loaded any `.env` file:
//!
//! | variable              | overrides                 |
//! |-----------------------|---------------------------|
//! | `FLOODSIM_STATE_PATH` | `persistence.state_path`  |
//! | `FLOODSIM_LOG_LEVEL`  | `logging.level`           |
//! | `FLOODSIM_LOG_FILE`   | `logging.file`            |
//! | `FLOODSIM_SEED`       | `simulation.seed`         |

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::{DEFAULT_FLOW_THRESHOLD, DEFAULT_LEVEL_THRESHOLD, ThresholdConfig};
use crate::simulation::{drift, hazard};

/// Config file looked up when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "floodsim.toml";

/// Longest accepted tick period: one day.
pub const MAX_PERIOD_MS: u64 = 86_400_000;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub drift_period_ms: u64,
    pub hazard_period_ms: u64,
    pub level_drift: f64,
    pub flow_drift: f64,
    /// Fixed drift seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            drift_period_ms: drift::DEFAULT_PERIOD_MS,
            hazard_period_ms: hazard::DEFAULT_PERIOD_MS,
            level_drift: drift::DEFAULT_LEVEL_DRIFT,
            flow_drift: drift::DEFAULT_FLOW_DRIFT,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub level_threshold: f64,
    pub flow_threshold: f64,
    pub level_warnings: bool,
    pub flow_warnings: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            level_threshold: DEFAULT_LEVEL_THRESHOLD,
            flow_threshold: DEFAULT_FLOW_THRESHOLD,
            level_warnings: true,
            flow_warnings: true,
        }
    }
}

impl AlertConfig {
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            level_threshold: self.level_threshold,
            flow_threshold: self.flow_threshold,
            level_warnings_enabled: self.level_warnings,
            flow_warnings_enabled: self.flow_warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub state_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_path: "floodsim_state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub alerts: AlertConfig,
    pub auth: AuthConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(String),
    /// The file is not valid TOML or does not match the expected shape.
    Parse(String),
    /// A value parsed but is outside what the service can run with.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads `path`, or the default config file when `path` is `None`.
    ///
    /// A missing default file yields built-in defaults; a missing explicit
    /// file is an error. Environment overrides are applied afterwards and
    /// the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
                Self::from_toml_str(&text)?
            }
            None => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(text) => Self::from_toml_str(&text)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
                Err(e) => return Err(ConfigError::Io(format!("{}: {}", DEFAULT_CONFIG_PATH, e))),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `FLOODSIM_*` overrides fetched through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = present("FLOODSIM_STATE_PATH") {
            self.persistence.state_path = path;
        }
        if let Some(level) = present("FLOODSIM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = present("FLOODSIM_LOG_FILE") {
            self.logging.file = Some(file);
        }
        if let Some(seed) = present("FLOODSIM_SEED") {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("FLOODSIM_SEED is not a number: {}", seed)))?;
            self.simulation.seed = Some(seed);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.drift_period_ms == 0 || sim.hazard_period_ms == 0 {
            return Err(ConfigError::Invalid("tick periods must be positive".to_string()));
        }
        if sim.drift_period_ms > MAX_PERIOD_MS || sim.hazard_period_ms > MAX_PERIOD_MS {
            return Err(ConfigError::Invalid(format!(
                "tick periods must not exceed {}ms",
                MAX_PERIOD_MS
            )));
        }
        if !(sim.level_drift.is_finite() && sim.level_drift >= 0.0)
            || !(sim.flow_drift.is_finite() && sim.flow_drift >= 0.0)
        {
            return Err(ConfigError::Invalid(
                "drift bounds must be finite and non-negative".to_string(),
            ));
        }
        if !self.alerts.level_threshold.is_finite() || !self.alerts.flow_threshold.is_finite() {
            return Err(ConfigError::Invalid("thresholds must be finite".to_string()));
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging.level.parse::<LogLevel>().map_err(ConfigError::Invalid)
    }
}
