//! Persisted dashboard state.
//!
//! The JSON shape matches what the browser dashboard kept in local storage
//! (`globalThreshold`, `flowThreshold`, the two warning toggles, the node
//! list and the notification list) plus the hazard flag and parameters.
//! Schedules are never persisted; an active hazard is re-armed on restore.
//!
//! Missing fields fall back to defaults, so an older or hand-edited file
//! still loads.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dashboard::StateListener;
use crate::logging::{self, Component};
use crate::model::{
    DEFAULT_FLOW_THRESHOLD, DEFAULT_LEVEL_THRESHOLD, Node, NotificationEntry, ThresholdConfig,
};
use crate::simulation::hazard::HazardSimulationState;
use crate::stations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(default = "default_level_threshold")]
    pub global_threshold: f64,
    #[serde(default = "default_flow_threshold")]
    pub flow_threshold: f64,
    #[serde(default = "enabled")]
    pub level_warnings_enabled: bool,
    #[serde(default = "enabled")]
    pub flow_warnings_enabled: bool,
    #[serde(default = "stations::seed_nodes")]
    pub nodes: Vec<Node>,
    /// Newest first.
    #[serde(default)]
    pub notifications: Vec<NotificationEntry>,
    #[serde(default)]
    pub hazard_active: bool,
    #[serde(default)]
    pub hazard: Option<HazardSimulationState>,
}

fn default_level_threshold() -> f64 {
    DEFAULT_LEVEL_THRESHOLD
}

fn default_flow_threshold() -> f64 {
    DEFAULT_FLOW_THRESHOLD
}

fn enabled() -> bool {
    true
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            global_threshold: DEFAULT_LEVEL_THRESHOLD,
            flow_threshold: DEFAULT_FLOW_THRESHOLD,
            level_warnings_enabled: true,
            flow_warnings_enabled: true,
            nodes: stations::seed_nodes(),
            notifications: Vec::new(),
            hazard_active: false,
            hazard: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "State file error: {}", e),
            SnapshotError::Serde(e) => write!(f, "State format error: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Serde(e)
    }
}

// ---------------------------------------------------------------------------
// (De)serialization
// ---------------------------------------------------------------------------

impl DashboardSnapshot {
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            level_threshold: self.global_threshold,
            flow_threshold: self.flow_threshold,
            level_warnings_enabled: self.level_warnings_enabled,
            flow_warnings_enabled: self.flow_warnings_enabled,
        }
    }

    /// The hazard to resume, if the snapshot says one was running.
    pub fn active_hazard(&self) -> Option<&HazardSimulationState> {
        self.hazard.as_ref().filter(|_| self.hazard_active)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes atomically: a sibling temp file is renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reads `path`. A missing file is `Ok(None)`, not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(Self::from_json(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// File persistence listener
// ---------------------------------------------------------------------------

/// Saves the snapshot to disk after every state change.
///
/// Write failures are logged and otherwise ignored; the session keeps
/// running on its in-memory state.
#[derive(Debug, Clone)]
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateListener for JsonStateFile {
    fn state_changed(&mut self, snapshot: &DashboardSnapshot) {
        if let Err(e) = snapshot.save(&self.path) {
            logging::error(
                Component::Persist,
                Some(&self.path.display().to_string()),
                &format!("save failed: {}", e),
            );
        }
    }
}
