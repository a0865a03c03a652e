//! Hazard scenario engine.
//!
//! A scenario is a time-boxed override of every node's readings. Starting one
//! snapshots the store as the baseline; each tick derives new readings from
//! the baseline, the previous tick's reading, the elapsed fraction of the
//! scenario and the intensity multiplier. The formulas are closed-form and
//! random-free, so identical inputs always give identical trajectories.
//!
//! While a scenario is active the engine is the only writer of node
//! readings (see `drift`). Alerts are edge-triggered against the previous
//! tick's values, not the baseline.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::thresholds::{self, AlertEvent, Observation};
use crate::logging::{self, Component};
use crate::model::{DashboardError, Intensity, NodeId, Reading, Scenario, ThresholdConfig};
use crate::schedule::RecurringTask;
use crate::store::NodeStore;

/// Nominal hazard tick period.
pub const DEFAULT_PERIOD_MS: u64 = 500;

/// Level the recovery scenario relaxes toward, in meters.
pub const RECOVERY_TARGET_LEVEL: f64 = 3.5;
/// Flow the recovery scenario relaxes toward, in meters per second.
pub const RECOVERY_TARGET_FLOW: f64 = 1.5;

// ---------------------------------------------------------------------------
// Scenario formulas
// ---------------------------------------------------------------------------

/// Computes one node's next reading for `scenario` at `progress` in `[0, 1)`.
///
/// `baseline` is the node's reading when the scenario started; `previous` is
/// its reading after the last tick. `k` is the intensity multiplier. The
/// result is clamped into the physical ranges.
///
/// Blockage and recovery deliberately mix reference points: blockage's
/// level rise is measured from baseline but its decay from the previous
/// tick, and recovery always relaxes from the previous tick.
pub fn scenario_reading(
    scenario: Scenario,
    baseline: Reading,
    previous: Reading,
    progress: f64,
    k: f64,
) -> Reading {
    let m = baseline.water_level;
    let f = baseline.water_flow;
    let p = progress;

    let (level, flow) = match scenario {
        Scenario::HeavyRain => (m + p * 4.0 * k, f + p * 2.0 * k),
        Scenario::FlashFlood => {
            if p < 0.2 {
                (m + p * 20.0 * k, f + p * 10.0 * k)
            } else {
                (m + 4.0 * k, f + 2.0 * k)
            }
        }
        Scenario::Blockage => {
            if p < 0.3 {
                (previous.water_level, f * (1.0 - 3.0 * p))
            } else if p < 0.7 {
                (m + (p - 0.3) * 5.0 * k, 0.0)
            } else {
                ((previous.water_level - 0.1).max(m), (p - 0.7) * 3.0 * f)
            }
        }
        Scenario::Recovery => (
            previous.water_level + (RECOVERY_TARGET_LEVEL - previous.water_level) * p * 0.5,
            previous.water_flow + (RECOVERY_TARGET_FLOW - previous.water_flow) * p * 0.5,
        ),
    };

    Reading::clamped(level, flow)
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Everything that defines a running scenario. Exists only while active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardSimulationState {
    pub scenario: Scenario,
    pub intensity: Intensity,
    pub start_time: DateTime<Utc>,
    pub total_duration_ms: u64,
    /// Per-node readings at the instant the scenario started.
    pub baseline: BTreeMap<NodeId, Reading>,
}

impl HazardSimulationState {
    pub fn total_duration(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.total_duration_ms).unwrap_or(i64::MAX / 2))
    }

    /// Milliseconds elapsed at `now`, never negative.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_milliseconds().max(0)
    }

    /// Elapsed fraction of the total duration. Not capped at 1.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        if self.total_duration_ms == 0 {
            return 1.0;
        }
        self.elapsed_ms(now) as f64 / self.total_duration_ms as f64
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.total_duration().num_milliseconds() - self.elapsed_ms(now)).max(0)
    }
}

/// Converts an operator-supplied duration in seconds to whole milliseconds.
pub fn duration_ms_from_secs(secs: f64) -> Result<u64, DashboardError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(DashboardError::InvalidDuration(secs));
    }
    let millis = (secs * 1000.0).round();
    if millis < 1.0 || millis > u64::MAX as f64 {
        return Err(DashboardError::InvalidDuration(secs));
    }
    Ok(millis as u64)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Result of one hazard tick.
#[derive(Debug, Clone, PartialEq)]
pub enum HazardTick {
    /// No scenario was active.
    Idle,
    /// Nodes were rewritten for this progress value.
    Progressed { progress: f64, alerts: Vec<AlertEvent> },
    /// The scenario ran its full duration; no node was touched this tick.
    Completed { scenario: Scenario },
}

#[derive(Debug, Clone)]
pub struct HazardEngine {
    task: RecurringTask,
    state: Option<HazardSimulationState>,
}

impl HazardEngine {
    pub fn new(period_ms: u64) -> Self {
        Self {
            task: RecurringTask::from_millis(period_ms),
            state: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&HazardSimulationState> {
        self.state.as_ref()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.task.next_due()
    }

    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.task.take_due(now)
    }

    /// Inactive -> Active. Snapshots every node as the baseline.
    pub fn start(
        &mut self,
        scenario: Scenario,
        duration_ms: u64,
        intensity: Intensity,
        store: &NodeStore,
        now: DateTime<Utc>,
    ) -> Result<&HazardSimulationState, DashboardError> {
        if self.state.is_some() {
            return Err(DashboardError::HazardAlreadyActive);
        }
        if duration_ms == 0 {
            return Err(DashboardError::InvalidDuration(0.0));
        }

        let baseline = store
            .list()
            .iter()
            .map(|node| (node.id, node.reading()))
            .collect();

        logging::info(
            Component::Hazard,
            None,
            &format!(
                "{} ({}) started for {}ms across {} nodes",
                scenario,
                intensity,
                duration_ms,
                store.len()
            ),
        );

        self.task.start(now);
        Ok(&*self.state.insert(HazardSimulationState {
            scenario,
            intensity,
            start_time: now,
            total_duration_ms: duration_ms,
            baseline,
        }))
    }

    /// Active -> Inactive without completion. Hands back the cleared state.
    pub fn stop(&mut self) -> Result<HazardSimulationState, DashboardError> {
        let state = self.state.take().ok_or(DashboardError::HazardNotActive)?;
        self.task.stop();
        logging::info(Component::Hazard, None, &format!("{} stopped manually", state.scenario));
        Ok(state)
    }

    /// Re-arms a persisted scenario. Ticks resume one period after `now`;
    /// progress still counts from the original start time.
    pub fn restore(&mut self, state: HazardSimulationState, now: DateTime<Utc>) {
        logging::info(
            Component::Hazard,
            None,
            &format!("resuming {} at {:.0}%", state.scenario, state.progress_at(now) * 100.0),
        );
        self.state = Some(state);
        self.task.start(now);
    }

    /// Runs one tick observed at `now`.
    pub fn tick(
        &mut self,
        store: &mut NodeStore,
        config: &ThresholdConfig,
        now: DateTime<Utc>,
    ) -> HazardTick {
        let Some(state) = self.state.as_ref() else {
            return HazardTick::Idle;
        };

        let progress = state.progress_at(now);
        if progress >= 1.0 {
            let scenario = state.scenario;
            self.state = None;
            self.task.stop();
            logging::info(Component::Hazard, None, &format!("{} completed", scenario));
            return HazardTick::Completed { scenario };
        }

        let k = state.intensity.multiplier();
        let mut alerts = Vec::new();
        for id in store.ids() {
            // Nodes added mid-scenario have no baseline and are left alone.
            let Some(&baseline) = state.baseline.get(&id) else {
                continue;
            };
            let Some(node) = store.get_mut(id) else {
                continue;
            };
            let previous = Observation::of(node);
            let next = scenario_reading(state.scenario, baseline, node.reading(), progress, k);
            node.set_reading(next);
            alerts.extend(thresholds::evaluate(node, &previous, config));
        }

        HazardTick::Progressed { progress, alerts }
    }
}

impl Default for HazardEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_MS)
    }
}
