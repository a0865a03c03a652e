/// Node, Reading, ThresholdConfig, NotificationEntry, Scenario, Intensity, DashboardError
/// core data structures and error handling
///
/// Core data types for the flood simulation dashboard.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no scheduling, no I/O, and no randomness: only types and the
/// range normalization every writer of a reading goes through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Physical ranges
// ---------------------------------------------------------------------------

/// Lowest representable water level, in meters.
pub const LEVEL_MIN: f64 = 0.0;

/// Highest representable water level, in meters.
pub const LEVEL_MAX: f64 = 10.0;

/// Lowest representable flow rate, in meters per second.
pub const FLOW_MIN: f64 = 0.0;

/// Highest representable flow rate, in meters per second.
pub const FLOW_MAX: f64 = 5.0;

/// Stable identifier assigned by the node store.
pub type NodeId = u32;

/// Clamps a water level into `[LEVEL_MIN, LEVEL_MAX]`.
pub fn clamp_level(value: f64) -> f64 {
    value.clamp(LEVEL_MIN, LEVEL_MAX)
}

/// Clamps a flow rate into `[FLOW_MIN, FLOW_MAX]`.
pub fn clamp_flow(value: f64) -> f64 {
    value.clamp(FLOW_MIN, FLOW_MAX)
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// WGS84 position of a sensor site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The two values a node reports: water level (m) and water flow (m/s).
///
/// Always inside the physical ranges once constructed. Out-of-range finite
/// input is normalized, never rejected; non-finite input is rejected by
/// [`Reading::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub water_level: f64,
    pub water_flow: f64,
}

impl Reading {
    /// Validates and normalizes operator-supplied values.
    pub fn new(water_level: f64, water_flow: f64) -> Result<Self, DashboardError> {
        let water_level = finite_reading("waterLevel", water_level)?;
        let water_flow = finite_reading("waterFlow", water_flow)?;
        Ok(Self::clamped(water_level, water_flow))
    }

    /// Normalizes simulator output into the physical ranges.
    pub fn clamped(water_level: f64, water_flow: f64) -> Self {
        Self {
            water_level: clamp_level(water_level),
            water_flow: clamp_flow(water_flow),
        }
    }
}

/// Rejects NaN and infinities for a named reading field.
pub fn finite_reading(field: &'static str, value: f64) -> Result<f64, DashboardError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DashboardError::InvalidReading { field, value })
    }
}

/// A simulated sensor site.
///
/// Serialized flat (`id, name, lat, lng, waterLevel, waterFlow`) so the
/// persisted node list keeps the dashboard's storage shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub position: Position,
    pub water_level: f64,
    pub water_flow: f64,
}

impl Node {
    pub fn reading(&self) -> Reading {
        Reading {
            water_level: self.water_level,
            water_flow: self.water_flow,
        }
    }

    pub fn set_reading(&mut self, reading: Reading) {
        self.water_level = reading.water_level;
        self.water_flow = reading.water_flow;
    }

    /// Whether the map and table badge this node as "Critical".
    pub fn is_critical(&self, level_threshold: f64) -> bool {
        self.water_level > level_threshold
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Default critical water level, in meters.
pub const DEFAULT_LEVEL_THRESHOLD: f64 = 5.0;

/// Default low-flow threshold, in meters per second.
pub const DEFAULT_FLOW_THRESHOLD: f64 = 1.0;

/// Process-wide alerting configuration.
///
/// Changing a threshold never re-evaluates existing nodes; it only affects
/// the next comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    pub level_threshold: f64,
    pub flow_threshold: f64,
    pub level_warnings_enabled: bool,
    pub flow_warnings_enabled: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            level_threshold: DEFAULT_LEVEL_THRESHOLD,
            flow_threshold: DEFAULT_FLOW_THRESHOLD,
            level_warnings_enabled: true,
            flow_warnings_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// One immutable entry in the notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    /// Milliseconds since the Unix epoch at append time, bumped if needed
    /// to stay strictly increasing.
    pub id: u64,
    pub message: String,
    /// Local wall-clock time, e.g. "5/1/2024, 1:00:00 PM".
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Hazard scenario types
// ---------------------------------------------------------------------------

/// The named hydrological failure modes the hazard engine can replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    HeavyRain,
    FlashFlood,
    Blockage,
    Recovery,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::HeavyRain,
        Scenario::FlashFlood,
        Scenario::Blockage,
        Scenario::Recovery,
    ];

    /// Wire name, e.g. `heavy-rain`.
    pub fn key(&self) -> &'static str {
        match self {
            Scenario::HeavyRain => "heavy-rain",
            Scenario::FlashFlood => "flash-flood",
            Scenario::Blockage => "blockage",
            Scenario::Recovery => "recovery",
        }
    }

    /// Display name, e.g. `Heavy Rain`.
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::HeavyRain => "Heavy Rain",
            Scenario::FlashFlood => "Flash Flood",
            Scenario::Blockage => "Blockage",
            Scenario::Recovery => "Recovery",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Scenario {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.key() == wanted)
            .ok_or_else(|| DashboardError::UnknownScenario(s.to_string()))
    }
}

/// Scale applied to every magnitude term of a scenario formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn multiplier(&self) -> f64 {
        match self {
            Intensity::Low => 1.0,
            Intensity::Medium => 1.5,
            Intensity::High => 2.5,
        }
    }

    /// Capitalized display name.
    pub fn label(&self) -> &'static str {
        match self {
            Intensity::Low => "Low",
            Intensity::Medium => "Medium",
            Intensity::High => "High",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Low => write!(f, "low"),
            Intensity::Medium => write!(f, "medium"),
            Intensity::High => write!(f, "high"),
        }
    }
}

impl FromStr for Intensity {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            _ => Err(DashboardError::UnknownIntensity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by dashboard operations.
///
/// All of them are local refusals: the rejected operation leaves every
/// piece of state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// No node with this id exists in the store.
    NodeNotFound(NodeId),
    /// A hazard scenario is already running.
    HazardAlreadyActive,
    /// A stop was requested while no hazard scenario is running.
    HazardNotActive,
    /// A level or flow value was NaN or infinite.
    InvalidReading { field: &'static str, value: f64 },
    /// A threshold value was NaN or infinite.
    InvalidThreshold { field: &'static str, value: f64 },
    /// Hazard durations must be finite and strictly positive.
    InvalidDuration(f64),
    /// The operation requires a logged-in operator.
    NotAuthenticated(String),
    /// Login credentials did not match.
    AccessDenied,
    UnknownScenario(String),
    UnknownIntensity(String),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::NodeNotFound(id) => write!(f, "Node not found: {}", id),
            DashboardError::HazardAlreadyActive => {
                write!(f, "A hazard simulation is already active")
            }
            DashboardError::HazardNotActive => write!(f, "No hazard simulation is active"),
            DashboardError::InvalidReading { field, value } => {
                write!(f, "Invalid {}: {}", field, value)
            }
            DashboardError::InvalidThreshold { field, value } => {
                write!(f, "Invalid {} threshold: {}", field, value)
            }
            DashboardError::InvalidDuration(secs) => {
                write!(f, "Invalid hazard duration: {}s", secs)
            }
            DashboardError::NotAuthenticated(msg) => write!(f, "{}", msg),
            DashboardError::AccessDenied => write!(f, "Invalid username or password"),
            DashboardError::UnknownScenario(name) => write!(f, "Unknown scenario: {}", name),
            DashboardError::UnknownIntensity(name) => write!(f, "Unknown intensity: {}", name),
        }
    }
}

impl std::error::Error for DashboardError {}
