//! Hazard progress summaries for the simulation panel.
//!
//! Read-only: derives display values from the engine's state at an instant.

use chrono::{DateTime, Utc};

use super::hazard::HazardSimulationState;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveHazardStatus {
    pub scenario_label: &'static str,
    /// Capitalized, e.g. "High".
    pub intensity_label: &'static str,
    pub total_duration_secs: f64,
    pub remaining_secs: f64,
    /// Elapsed share of the scenario, in `[0, 100]`.
    pub progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HazardStatus {
    Inactive,
    Active(ActiveHazardStatus),
}

impl HazardStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, HazardStatus::Active(_))
    }

    /// One-line summary, e.g. "Heavy Rain (High intensity) - 40% complete, 18s remaining".
    pub fn summary(&self) -> String {
        match self {
            HazardStatus::Inactive => "No hazard simulation running".to_string(),
            HazardStatus::Active(status) => format!(
                "{} ({} intensity) - {:.0}% complete, {:.0}s remaining",
                status.scenario_label,
                status.intensity_label,
                status.progress_percent,
                status.remaining_secs.ceil()
            ),
        }
    }
}

pub fn report(state: Option<&HazardSimulationState>, now: DateTime<Utc>) -> HazardStatus {
    let Some(state) = state else {
        return HazardStatus::Inactive;
    };

    HazardStatus::Active(ActiveHazardStatus {
        scenario_label: state.scenario.label(),
        intensity_label: state.intensity.label(),
        total_duration_secs: state.total_duration_ms as f64 / 1000.0,
        remaining_secs: state.remaining_ms(now) as f64 / 1000.0,
        progress_percent: (state.progress_at(now) * 100.0).clamp(0.0, 100.0),
    })
}
