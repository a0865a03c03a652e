//! The monitoring session.
//!
//! `Dashboard` owns every piece of mutable state (node store, thresholds,
//! notification log, drift simulator, hazard engine, login gate) and is the
//! only entry point the view layer talks to. There are no globals: the
//! application root builds one `Dashboard` and hands out references.
//!
//! Every mutating call ends with exactly one "state changed" signal, which
//! bumps `revision()` and hands a fresh snapshot to each registered
//! `StateListener` (map/table refresh, persistence). Ticks follow the same
//! rule: all nodes are processed before the single signal fires.

use chrono::{DateTime, Utc};

use crate::alert::notifications::NotificationLog;
use crate::alert::thresholds::{self, AlertEvent, Observation};
use crate::auth::{Access, AccessGate};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::logging::{self, Component};
use crate::model::{
    DashboardError, Intensity, Node, NodeId, NotificationEntry, Position, Reading, Scenario,
    ThresholdConfig, finite_reading,
};
use crate::simulation::drift::{DriftOutcome, DriftSimulator};
use crate::simulation::hazard::{self, HazardEngine, HazardSimulationState, HazardTick};
use crate::simulation::status::{self, HazardStatus};
use crate::snapshot::DashboardSnapshot;
use crate::stations;
use crate::store::{NodeStore, NodeUpdate};

/// Receives the outbound "state changed" signal.
pub trait StateListener {
    fn state_changed(&mut self, snapshot: &DashboardSnapshot);
}

pub struct Dashboard {
    clock: Box<dyn Clock>,
    store: NodeStore,
    thresholds: ThresholdConfig,
    notifications: NotificationLog,
    drift: DriftSimulator,
    hazard: HazardEngine,
    gate: AccessGate,
    listeners: Vec<Box<dyn StateListener>>,
    revision: u64,
}

impl Dashboard {
    /// A fresh session seeded with the default node registry.
    pub fn new(config: &AppConfig, clock: Box<dyn Clock>) -> Self {
        Self::with_nodes(config, clock, stations::seed_nodes())
    }

    pub fn with_nodes(config: &AppConfig, clock: Box<dyn Clock>, nodes: Vec<Node>) -> Self {
        let sim = &config.simulation;
        Self {
            clock,
            store: NodeStore::from_nodes(nodes),
            thresholds: config.alerts.thresholds(),
            notifications: NotificationLog::new(),
            drift: DriftSimulator::new(sim.drift_period_ms, sim.level_drift, sim.flow_drift, sim.seed),
            hazard: HazardEngine::new(sim.hazard_period_ms),
            gate: AccessGate::new(config.auth.username.clone(), config.auth.password.clone()),
            listeners: Vec::new(),
            revision: 0,
        }
    }

    /// Rebuilds a session from a persisted snapshot. An active hazard is
    /// re-armed from the current instant; the drift simulator starts idle.
    pub fn restore(config: &AppConfig, clock: Box<dyn Clock>, snapshot: DashboardSnapshot) -> Self {
        let active_hazard = snapshot.active_hazard().cloned();
        let thresholds = snapshot.thresholds();
        let mut dashboard = Self::with_nodes(config, clock, snapshot.nodes);
        dashboard.thresholds = thresholds;
        dashboard.notifications = NotificationLog::from_entries(snapshot.notifications);
        if let Some(state) = active_hazard {
            let now = dashboard.clock.now();
            dashboard.hazard.restore(state, now);
        }
        logging::info(
            Component::Persist,
            None,
            &format!(
                "restored {} nodes, {} notifications",
                dashboard.store.len(),
                dashboard.notifications.len()
            ),
        );
        dashboard
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let hazard = self.hazard.state().cloned();
        DashboardSnapshot {
            global_threshold: self.thresholds.level_threshold,
            flow_threshold: self.thresholds.flow_threshold,
            level_warnings_enabled: self.thresholds.level_warnings_enabled,
            flow_warnings_enabled: self.thresholds.flow_warnings_enabled,
            nodes: self.store.list().to_vec(),
            notifications: self.notifications.to_vec(),
            hazard_active: hazard.is_some(),
            hazard,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn StateListener>) {
        self.listeners.push(listener);
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn nodes(&self) -> &[Node] {
        self.store.list()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    /// Nodes the map should draw as critical.
    pub fn critical_nodes(&self) -> Vec<&Node> {
        self.store
            .list()
            .iter()
            .filter(|n| n.is_critical(self.thresholds.level_threshold))
            .collect()
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn is_hazard_active(&self) -> bool {
        self.hazard.is_active()
    }

    pub fn hazard_state(&self) -> Option<&HazardSimulationState> {
        self.hazard.state()
    }

    pub fn hazard_status(&self) -> HazardStatus {
        status::report(self.hazard.state(), self.clock.now())
    }

    pub fn is_drift_running(&self) -> bool {
        self.drift.is_running()
    }

    pub fn access(&self) -> Access {
        self.gate.access()
    }

    /// Number of "state changed" signals emitted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Login gate
    // -----------------------------------------------------------------------

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), DashboardError> {
        self.gate.login(username, password)
    }

    pub fn continue_as_guest(&mut self) {
        self.gate.continue_as_guest();
    }

    pub fn logout(&mut self) {
        self.gate.logout();
    }

    // -----------------------------------------------------------------------
    // Node edits
    // -----------------------------------------------------------------------

    pub fn add_node(
        &mut self,
        name: &str,
        position: Position,
        water_level: f64,
        water_flow: f64,
    ) -> Result<Node, DashboardError> {
        self.authorize(Component::Store, "add nodes")?;
        let reading = Reading::new(water_level, water_flow)
            .and_then(|r| finite_reading("lat", position.lat).map(|_| r))
            .and_then(|r| finite_reading("lng", position.lng).map(|_| r));
        let reading = self.check(Component::Store, "add node", reading)?;

        let node = self.store.add(name, position, reading);
        logging::info(
            Component::Store,
            Some(&format!("node {}", node.id)),
            &format!("added \"{}\"", node.name),
        );
        self.notify(format!("New node \"{}\" added successfully", node.name));
        self.signal();
        Ok(node)
    }

    /// Operator edit. Crossings are reported exactly as a tick would report
    /// them, followed by an "updated successfully" entry.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<Node, DashboardError> {
        self.authorize(Component::Store, "edit node data")?;
        let validated = self.validate_update(id, &update);
        self.check(Component::Store, "update node", validated)?;

        let Some(previous) = self.store.get(id).map(Observation::of) else {
            return self.refuse(Component::Store, "update node", DashboardError::NodeNotFound(id));
        };
        self.store.update(id, update);
        let Some(node) = self.store.get(id).cloned() else {
            return self.refuse(Component::Store, "update node", DashboardError::NodeNotFound(id));
        };

        let events = thresholds::evaluate(&node, &previous, &self.thresholds);
        let now = self.clock.now();
        self.record_alerts(&events, now);
        self.notify(format!("{} data updated successfully", node.name));
        self.signal();
        Ok(node)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, DashboardError> {
        self.authorize(Component::Store, "remove nodes")?;
        let Some(node) = self.store.remove(id) else {
            return self.refuse(Component::Store, "remove node", DashboardError::NodeNotFound(id));
        };
        logging::info(
            Component::Store,
            Some(&format!("node {}", id)),
            &format!("removed \"{}\"", node.name),
        );
        self.notify(format!("Node \"{}\" has been removed", node.name));
        self.signal();
        Ok(node)
    }

    fn validate_update(&self, id: NodeId, update: &NodeUpdate) -> Result<(), DashboardError> {
        if !self.store.contains(id) {
            return Err(DashboardError::NodeNotFound(id));
        }
        if let Some(level) = update.water_level {
            finite_reading("waterLevel", level)?;
        }
        if let Some(flow) = update.water_flow {
            finite_reading("waterFlow", flow)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Threshold configuration
    // -----------------------------------------------------------------------

    /// Changes either or both thresholds. Existing nodes are not re-evaluated.
    pub fn set_thresholds(&mut self, level: Option<f64>, flow: Option<f64>) -> Result<(), DashboardError> {
        let validated = level
            .map(|v| finite_threshold("level", v))
            .transpose()
            .and_then(|_| flow.map(|v| finite_threshold("flow", v)).transpose());
        self.check(Component::Alert, "set thresholds", validated)?;

        if level.is_none() && flow.is_none() {
            return Ok(());
        }
        if let Some(level) = level {
            self.thresholds.level_threshold = level;
            self.notify(format!("Global threshold updated to {:.1}m", level));
        }
        if let Some(flow) = flow {
            self.thresholds.flow_threshold = flow;
            self.notify(format!("Flow threshold updated to {:.1}m/s", flow));
        }
        self.signal();
        Ok(())
    }

    pub fn toggle_warnings(&mut self, level: Option<bool>, flow: Option<bool>) {
        if level.is_none() && flow.is_none() {
            return;
        }
        if let Some(enabled) = level {
            self.thresholds.level_warnings_enabled = enabled;
            self.notify(format!("Water level warnings {}", enabled_word(enabled)));
        }
        if let Some(enabled) = flow {
            self.thresholds.flow_warnings_enabled = enabled;
            self.notify(format!("Water flow warnings {}", enabled_word(enabled)));
        }
        self.signal();
    }

    // -----------------------------------------------------------------------
    // Notification log
    // -----------------------------------------------------------------------

    pub fn remove_notification(&mut self, id: u64) -> bool {
        let removed = self.notifications.remove(id);
        if removed {
            self.signal();
        }
        removed
    }

    pub fn clear_notifications(&mut self) {
        if self.notifications.is_empty() {
            return;
        }
        self.notifications.clear();
        self.signal();
    }

    // -----------------------------------------------------------------------
    // Simulators
    // -----------------------------------------------------------------------

    /// Idle -> Running (or reschedule if already running).
    pub fn start_drift(&mut self) {
        let now = self.clock.now();
        self.drift.start(now);
    }

    pub fn stop_drift(&mut self) {
        self.drift.stop();
    }

    pub fn start_hazard(
        &mut self,
        scenario: Scenario,
        duration_secs: f64,
        intensity: Intensity,
    ) -> Result<HazardSimulationState, DashboardError> {
        self.authorize(Component::Hazard, "run simulations")?;
        let duration_ms = hazard::duration_ms_from_secs(duration_secs);
        let duration_ms = self.check(Component::Hazard, "start hazard", duration_ms)?;

        let now = self.clock.now();
        let started = self
            .hazard
            .start(scenario, duration_ms, intensity, &self.store, now)
            .map(HazardSimulationState::clone);
        let state = self.check(Component::Hazard, "start hazard", started)?;

        self.notify(format!(
            "Hazard simulation started: {} ({} intensity, {}s)",
            scenario.label(),
            intensity.label(),
            duration_secs
        ));
        self.signal();
        Ok(state)
    }

    /// Cancels the running scenario. Nodes keep their current readings.
    pub fn stop_hazard(&mut self) -> Result<(), DashboardError> {
        self.authorize(Component::Hazard, "run simulations")?;
        let stopped = self.hazard.stop();
        self.check(Component::Hazard, "stop hazard", stopped)?;
        self.notify("Hazard simulation stopped manually");
        self.signal();
        Ok(())
    }

    /// Runs every tick that has come due by the clock's current instant,
    /// earliest first (drift before hazard on a tie). Each tick observes its
    /// own scheduled instant. Returns the number of ticks run.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        loop {
            let drift_due = self.drift.next_due().filter(|due| *due <= now);
            let hazard_due = self.hazard.next_due().filter(|due| *due <= now);
            let hazard_first = match (drift_due, hazard_due) {
                (None, None) => break,
                (Some(drift), Some(hazard)) => hazard < drift,
                (None, Some(_)) => true,
                (Some(_), None) => false,
            };

            if hazard_first {
                if let Some(at) = self.hazard.take_due(now) {
                    self.run_hazard_tick(at);
                }
            } else if let Some(at) = self.drift.take_due(now) {
                self.run_drift_tick(at);
            }
            ran += 1;
        }
        ran
    }

    /// Runs one drift tick immediately, outside the schedule.
    pub fn tick_drift(&mut self) {
        let now = self.clock.now();
        self.run_drift_tick(now);
    }

    fn run_drift_tick(&mut self, at: DateTime<Utc>) {
        let outcome = self
            .drift
            .tick(&mut self.store, &self.thresholds, self.hazard.is_active());
        if let DriftOutcome::Applied { nodes, alerts } = outcome {
            self.record_alerts(&alerts, at);
            logging::log_tick_summary(Component::Drift, nodes, alerts.len());
            self.signal();
        }
    }

    fn run_hazard_tick(&mut self, at: DateTime<Utc>) {
        match self.hazard.tick(&mut self.store, &self.thresholds, at) {
            HazardTick::Idle => {}
            HazardTick::Progressed { alerts, .. } => {
                self.record_alerts(&alerts, at);
                logging::log_tick_summary(Component::Hazard, self.store.len(), alerts.len());
                self.signal();
            }
            HazardTick::Completed { scenario } => {
                self.notifications
                    .append_at(format!("Hazard simulation completed: {}", scenario.label()), at);
                self.signal();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn record_alerts(&mut self, events: &[AlertEvent], at: DateTime<Utc>) {
        for event in events {
            self.notifications.append_at(event.message(), at);
        }
    }

    fn notify(&mut self, message: impl Into<String>) -> NotificationEntry {
        let now = self.clock.now();
        self.notifications.append_at(message, now)
    }

    fn signal(&mut self) {
        self.revision += 1;
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener.state_changed(&snapshot);
        }
        self.listeners = listeners;
    }

    fn authorize(&self, component: Component, action: &str) -> Result<(), DashboardError> {
        let allowed = self.gate.require(action);
        self.check(component, action, allowed)
    }

    fn check<T>(
        &self,
        component: Component,
        operation: &str,
        result: Result<T, DashboardError>,
    ) -> Result<T, DashboardError> {
        result.or_else(|err| self.refuse(component, operation, err))
    }

    fn refuse<T>(&self, component: Component, operation: &str, err: DashboardError) -> Result<T, DashboardError> {
        logging::log_refusal(component, None, operation, &err);
        Err(err)
    }
}

fn finite_threshold(field: &'static str, value: f64) -> Result<f64, DashboardError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DashboardError::InvalidThreshold { field, value })
    }
}

fn enabled_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.simulation.seed = Some(5);
        config
    }

    fn session() -> (Dashboard, ManualClock) {
        let clock = ManualClock::new(t0());
        let mut dashboard = Dashboard::new(&config(), Box::new(clock.clone()));
        dashboard.login("admin", "admin").expect("default login");
        (dashboard, clock)
    }

    struct Recorder(Rc<RefCell<Vec<DashboardSnapshot>>>);

    impl StateListener for Recorder {
        fn state_changed(&mut self, snapshot: &DashboardSnapshot) {
            self.0.borrow_mut().push(snapshot.clone());
        }
    }

    #[test]
    fn test_fresh_session_uses_seed_nodes_and_default_thresholds() {
        let (dashboard, _) = session();
        assert_eq!(dashboard.nodes().len(), 15);
        assert_eq!(*dashboard.thresholds(), ThresholdConfig::default());
        // North Wing 6.2, West Campus 5.5, Covered Courts 5.8, Science 6.5, Student Center 5.2
        assert_eq!(dashboard.critical_nodes().len(), 5);
    }

    #[test]
    fn test_guest_cannot_edit_and_state_is_unchanged() {
        let clock = ManualClock::new(t0());
        let mut dashboard = Dashboard::new(&config(), Box::new(clock));
        dashboard.continue_as_guest();
        let result = dashboard.remove_node(1);
        assert_eq!(
            result.err(),
            Some(DashboardError::NotAuthenticated("Please login to remove nodes".to_string()))
        );
        assert_eq!(dashboard.nodes().len(), 15);
        assert_eq!(dashboard.revision(), 0);
        assert!(dashboard.notifications().is_empty());
    }

    #[test]
    fn test_add_node_assigns_next_id_and_notifies() {
        let (mut dashboard, _) = session();
        let node = dashboard
            .add_node("Chapel", Position::new(14.5995, 121.0112), 2.0, 1.1)
            .expect("add succeeds");
        assert_eq!(node.id, 16);
        assert_eq!(
            dashboard.notifications().latest().map(|e| e.message.as_str()),
            Some("New node \"Chapel\" added successfully")
        );
        assert_eq!(dashboard.revision(), 1);
    }

    #[test]
    fn test_add_node_rejects_nan_level() {
        let (mut dashboard, _) = session();
        let result = dashboard.add_node("Bad", Position::new(14.6, 121.0), f64::NAN, 1.0);
        assert!(matches!(result, Err(DashboardError::InvalidReading { .. })));
        assert_eq!(dashboard.nodes().len(), 15);
    }

    #[test]
    fn test_update_node_reports_crossing_rename_and_success_in_order() {
        let (mut dashboard, _) = session();
        dashboard
            .update_node(
                1,
                NodeUpdate {
                    name: Some("Main Gate".to_string()),
                    water_level: Some(5.4),
                    water_flow: Some(0.7),
                },
            )
            .expect("update succeeds");
        assert_eq!(
            dashboard.notifications().messages(),
            vec![
                "Main Gate data updated successfully",
                "Node renamed from \"PUP Main Gate\" to \"Main Gate\"",
                "Main Gate flow rate dropped below threshold (0.7m/s)",
                "Main Gate reached critical level (5.4m)",
            ]
        );
        assert_eq!(dashboard.revision(), 1, "one signal per mutating call");
    }

    #[test]
    fn test_update_unknown_node_is_refused() {
        let (mut dashboard, _) = session();
        let result = dashboard.update_node(99, NodeUpdate::default());
        assert_eq!(result.err(), Some(DashboardError::NodeNotFound(99)));
        assert_eq!(dashboard.revision(), 0);
    }

    #[test]
    fn test_threshold_change_does_not_reevaluate_nodes() {
        let (mut dashboard, _) = session();
        dashboard.set_thresholds(Some(3.0), None).expect("valid threshold");
        assert_eq!(
            dashboard.notifications().messages(),
            vec!["Global threshold updated to 3.0m"]
        );
        assert!(dashboard.set_thresholds(None, Some(f64::INFINITY)).is_err());
        assert_eq!(dashboard.thresholds().flow_threshold, 1.0);
    }

    #[test]
    fn test_toggle_warnings_messages() {
        let (mut dashboard, _) = session();
        dashboard.toggle_warnings(Some(false), Some(true));
        assert_eq!(
            dashboard.notifications().messages(),
            vec!["Water flow warnings enabled", "Water level warnings disabled"]
        );
        assert!(!dashboard.thresholds().level_warnings_enabled);
    }

    #[test]
    fn test_listener_sees_one_snapshot_per_drift_tick() {
        let (mut dashboard, clock) = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        dashboard.add_listener(Box::new(Recorder(seen.clone())));

        dashboard.start_drift();
        clock.advance_millis(9_000);
        assert_eq!(dashboard.pump(), 3);
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(seen.borrow()[2].nodes, dashboard.nodes().to_vec());
    }

    #[test]
    fn test_hazard_second_start_is_refused() {
        let (mut dashboard, _) = session();
        dashboard
            .start_hazard(Scenario::HeavyRain, 10.0, Intensity::Low)
            .expect("first start");
        let revision = dashboard.revision();
        let again = dashboard.start_hazard(Scenario::Recovery, 5.0, Intensity::High);
        assert_eq!(again.err(), Some(DashboardError::HazardAlreadyActive));
        assert_eq!(dashboard.revision(), revision);
        assert_eq!(
            dashboard.hazard_state().map(|s| s.scenario),
            Some(Scenario::HeavyRain)
        );
    }

    #[test]
    fn test_stop_hazard_without_one_running_is_refused() {
        let (mut dashboard, _) = session();
        assert_eq!(dashboard.stop_hazard(), Err(DashboardError::HazardNotActive));
    }
}
