//! Background drift simulator.
//!
//! Every tick nudges each node by a uniform random delta (level in
//! `[-level_drift, +level_drift]`, flow in `[-flow_drift, +flow_drift]`),
//! clamps to the physical ranges and reports crossings. A running hazard
//! scenario owns the store exclusively, so the whole tick is skipped when
//! one is active; the flag is read once, at the start of the tick.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::alert::thresholds::{self, AlertEvent, Observation};
use crate::logging::{self, Component};
use crate::model::{Reading, ThresholdConfig};
use crate::schedule::RecurringTask;
use crate::store::NodeStore;

/// Nominal drift period.
pub const DEFAULT_PERIOD_MS: u64 = 3_000;
/// Default bound on the per-tick level change, in meters.
pub const DEFAULT_LEVEL_DRIFT: f64 = 0.2;
/// Default bound on the per-tick flow change, in meters per second.
pub const DEFAULT_FLOW_DRIFT: f64 = 0.1;

/// Result of one drift tick.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftOutcome {
    /// A hazard scenario was active; no node was touched.
    Skipped,
    /// Every node was nudged. `alerts` are in node order.
    Applied { nodes: usize, alerts: Vec<AlertEvent> },
}

#[derive(Debug, Clone)]
pub struct DriftSimulator {
    task: RecurringTask,
    rng: ChaCha8Rng,
    level_drift: f64,
    flow_drift: f64,
}

impl DriftSimulator {
    pub fn new(period_ms: u64, level_drift: f64, flow_drift: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            task: RecurringTask::from_millis(period_ms),
            rng,
            level_drift: level_drift.abs(),
            flow_drift: flow_drift.abs(),
        }
    }

    /// Idle -> Running. Starting while running replaces the old schedule.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.task.is_running() {
            logging::debug(Component::Drift, None, "restarting drift schedule");
        }
        self.task.start(now);
        logging::info(
            Component::Drift,
            None,
            &format!("drift simulator running every {}ms", self.task.period().num_milliseconds()),
        );
    }

    /// Running -> Idle.
    pub fn stop(&mut self) {
        if self.task.is_running() {
            logging::info(Component::Drift, None, "drift simulator stopped");
        }
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.task.next_due()
    }

    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.task.take_due(now)
    }

    /// Runs one tick against the store.
    pub fn tick(
        &mut self,
        store: &mut NodeStore,
        config: &ThresholdConfig,
        hazard_active: bool,
    ) -> DriftOutcome {
        if hazard_active {
            logging::debug(Component::Drift, None, "hazard active, drift tick skipped");
            return DriftOutcome::Skipped;
        }

        let mut alerts = Vec::new();
        for id in store.ids() {
            let Some(node) = store.get_mut(id) else {
                continue;
            };
            let previous = Observation::of(node);
            let level_delta = self.rng.gen_range(-self.level_drift..=self.level_drift);
            let flow_delta = self.rng.gen_range(-self.flow_drift..=self.flow_drift);

            node.set_reading(Reading::clamped(
                previous.water_level + level_delta,
                previous.water_flow + flow_delta,
            ));
            alerts.extend(thresholds::evaluate(node, &previous, config));
        }

        DriftOutcome::Applied {
            nodes: store.len(),
            alerts,
        }
    }
}

impl Default for DriftSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_MS, DEFAULT_LEVEL_DRIFT, DEFAULT_FLOW_DRIFT, None)
    }
}
