/// Integration tests for the simulation and alerting pipeline
///
/// Tests verify:
/// 1. Hazard scenarios run to completion and emit exactly one completion entry
/// 2. Drift is suspended while a hazard owns the node readings
/// 3. Alerts are edge-triggered against the previous reading
/// 4. Readings never leave their physical ranges
/// 5. Edits and hazard control are refused without a login
///
/// All tests drive a `ManualClock`, so they never sleep.
///
/// Run with: cargo test --test simulation_integration

use chrono::{DateTime, TimeZone, Utc};
use floodsim_service::config::AppConfig;
use floodsim_service::model::{FLOW_MAX, FLOW_MIN, LEVEL_MAX, LEVEL_MIN};
use floodsim_service::{
    Dashboard, DashboardError, Intensity, ManualClock, NodeUpdate, Position, Scenario,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

fn seeded_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.seed = Some(2024);
    config
}

fn operator_session(config: &AppConfig) -> (Dashboard, ManualClock) {
    let clock = ManualClock::new(t0());
    let mut dashboard = Dashboard::new(config, Box::new(clock.clone()));
    dashboard.login("admin", "admin").expect("default credentials");
    (dashboard, clock)
}

fn count_containing(dashboard: &Dashboard, needle: &str) -> usize {
    dashboard
        .notifications()
        .messages()
        .iter()
        .filter(|m| m.contains(needle))
        .count()
}

// ---------------------------------------------------------------------------
// Hazard lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_heavy_rain_runs_to_completion() {
    let (mut dashboard, clock) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::HeavyRain, 10.0, Intensity::High)
        .expect("hazard starts");
    assert_eq!(
        dashboard.notifications().latest().map(|e| e.message.as_str()),
        Some("Hazard simulation started: Heavy Rain (High intensity, 10s)")
    );

    clock.advance_millis(10_000);
    // 19 progressed ticks, then the one at 100% completes the scenario
    assert_eq!(dashboard.pump(), 20);
    assert!(!dashboard.is_hazard_active());
    assert!(dashboard.hazard_state().is_none());
    assert_eq!(count_containing(&dashboard, "Hazard simulation completed: Heavy Rain"), 1);
    assert_eq!(
        dashboard.notifications().latest().map(|e| e.message.as_str()),
        Some("Hazard simulation completed: Heavy Rain")
    );

    // Every node that started at or below 5.0m crossed exactly once.
    assert_eq!(count_containing(&dashboard, "reached critical level"), 10);
    assert_eq!(count_containing(&dashboard, "PUP Main Gate reached critical level (5.2m)"), 1);
    assert_eq!(count_containing(&dashboard, "flow rate dropped below threshold"), 0);
}

#[test]
fn test_completed_hazard_no_longer_touches_nodes() {
    let (mut dashboard, clock) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::FlashFlood, 2.0, Intensity::Low)
        .expect("hazard starts");

    clock.advance_millis(2_500);
    assert_eq!(dashboard.pump(), 4);
    let after_completion = dashboard.nodes().to_vec();
    let entries = dashboard.notifications().len();

    clock.advance_millis(5_000);
    assert_eq!(dashboard.pump(), 0);
    assert_eq!(dashboard.nodes(), after_completion.as_slice());
    assert_eq!(dashboard.notifications().len(), entries);
}

#[test]
fn test_manual_stop_keeps_current_readings() {
    let (mut dashboard, clock) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::FlashFlood, 20.0, Intensity::Medium)
        .expect("hazard starts");
    clock.advance_millis(1_000);
    dashboard.pump();
    let mid_scenario = dashboard.nodes().to_vec();

    dashboard.stop_hazard().expect("hazard was running");
    assert!(!dashboard.is_hazard_active());
    assert_eq!(dashboard.nodes(), mid_scenario.as_slice());
    assert_eq!(
        dashboard.notifications().latest().map(|e| e.message.as_str()),
        Some("Hazard simulation stopped manually")
    );
    assert_eq!(count_containing(&dashboard, "Hazard simulation completed"), 0);

    clock.advance_millis(5_000);
    assert_eq!(dashboard.pump(), 0);
}

#[test]
fn test_second_hazard_is_refused_until_first_ends() {
    let (mut dashboard, clock) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::Blockage, 1.0, Intensity::Low)
        .expect("first hazard starts");
    assert_eq!(
        dashboard
            .start_hazard(Scenario::Recovery, 1.0, Intensity::Low)
            .err(),
        Some(DashboardError::HazardAlreadyActive)
    );

    clock.advance_millis(1_000);
    dashboard.pump();
    assert!(!dashboard.is_hazard_active());
    dashboard
        .start_hazard(Scenario::Recovery, 1.0, Intensity::Low)
        .expect("a new hazard may start once the first completed");
}

#[test]
fn test_non_positive_duration_is_refused() {
    let (mut dashboard, _) = operator_session(&seeded_config());
    assert_eq!(
        dashboard.start_hazard(Scenario::HeavyRain, 0.0, Intensity::Low).err(),
        Some(DashboardError::InvalidDuration(0.0))
    );
    assert!(dashboard.start_hazard(Scenario::HeavyRain, -3.0, Intensity::Low).is_err());
    assert!(!dashboard.is_hazard_active());
    assert!(dashboard.notifications().is_empty());
}

#[test]
fn test_node_added_mid_scenario_is_left_alone() {
    let (mut dashboard, clock) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::HeavyRain, 10.0, Intensity::High)
        .expect("hazard starts");
    let chapel = dashboard
        .add_node("Chapel", Position::new(14.5995, 121.0112), 2.0, 1.1)
        .expect("node added");
    dashboard.remove_node(3).expect("node removed");

    clock.advance_millis(2_000);
    assert_eq!(dashboard.pump(), 4);
    let node = dashboard.node(chapel.id).expect("chapel still present");
    assert_eq!((node.water_level, node.water_flow), (2.0, 1.1));
    assert!(dashboard.node(3).is_none());
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

#[test]
fn test_drift_is_suspended_while_hazard_active() {
    let (mut dashboard, _) = operator_session(&seeded_config());
    dashboard
        .start_hazard(Scenario::Recovery, 30.0, Intensity::Low)
        .expect("hazard starts");
    let before = dashboard.nodes().to_vec();
    let revision = dashboard.revision();

    dashboard.tick_drift();
    assert_eq!(dashboard.nodes(), before.as_slice());
    assert_eq!(dashboard.revision(), revision, "skipped tick emits no signal");
}

#[test]
fn test_wide_drift_stays_within_physical_ranges() {
    let mut config = seeded_config();
    config.simulation.level_drift = 4.0;
    config.simulation.flow_drift = 3.0;
    let (mut dashboard, clock) = operator_session(&config);

    dashboard.start_drift();
    clock.advance_millis(600_000);
    assert_eq!(dashboard.pump(), 200);

    for node in dashboard.nodes() {
        assert!(
            (LEVEL_MIN..=LEVEL_MAX).contains(&node.water_level),
            "{} level {} out of range",
            node.name,
            node.water_level
        );
        assert!(
            (FLOW_MIN..=FLOW_MAX).contains(&node.water_flow),
            "{} flow {} out of range",
            node.name,
            node.water_flow
        );
    }
}

#[test]
fn test_same_seed_gives_same_trajectory() {
    let (mut first, first_clock) = operator_session(&seeded_config());
    let (mut second, second_clock) = operator_session(&seeded_config());
    first.start_drift();
    second.start_drift();
    first_clock.advance_millis(30_000);
    second_clock.advance_millis(30_000);
    first.pump();
    second.pump();
    assert_eq!(first.nodes(), second.nodes());
    assert_eq!(
        first.notifications().messages(),
        second.notifications().messages()
    );
}

// ---------------------------------------------------------------------------
// Alert policy through operator edits
// ---------------------------------------------------------------------------

#[test]
fn test_staying_above_threshold_does_not_realert() {
    let (mut dashboard, _) = operator_session(&seeded_config());
    let raise = |level: f64| NodeUpdate {
        water_level: Some(level),
        ..NodeUpdate::default()
    };
    dashboard.update_node(1, raise(5.4)).expect("first edit");
    dashboard.update_node(1, raise(5.6)).expect("second edit");
    assert_eq!(count_containing(&dashboard, "reached critical level"), 1);

    dashboard.update_node(1, raise(4.0)).expect("drop back");
    dashboard.update_node(1, raise(5.1)).expect("cross again");
    assert_eq!(count_containing(&dashboard, "reached critical level"), 2);
}

#[test]
fn test_disabled_level_warnings_still_report_renames() {
    let (mut dashboard, _) = operator_session(&seeded_config());
    dashboard.toggle_warnings(Some(false), None);
    dashboard
        .update_node(
            4,
            NodeUpdate {
                name: Some("East Gate".to_string()),
                water_level: Some(9.0),
                water_flow: None,
            },
        )
        .expect("edit applies");
    assert_eq!(count_containing(&dashboard, "reached critical level"), 0);
    assert_eq!(
        count_containing(&dashboard, "Node renamed from \"East Campus\" to \"East Gate\""),
        1
    );
}

#[test]
fn test_out_of_range_edit_is_clamped() {
    let (mut dashboard, _) = operator_session(&seeded_config());
    let node = dashboard
        .update_node(
            2,
            NodeUpdate {
                water_level: Some(14.0),
                water_flow: Some(-2.0),
                ..NodeUpdate::default()
            },
        )
        .expect("edit applies");
    assert_eq!((node.water_level, node.water_flow), (LEVEL_MAX, FLOW_MIN));
}

// ---------------------------------------------------------------------------
// Login gate
// ---------------------------------------------------------------------------

#[test]
fn test_guest_session_is_read_only() {
    let clock = ManualClock::new(t0());
    let mut dashboard = Dashboard::new(&seeded_config(), Box::new(clock));
    dashboard.continue_as_guest();

    assert_eq!(
        dashboard.start_hazard(Scenario::FlashFlood, 10.0, Intensity::High).err(),
        Some(DashboardError::NotAuthenticated("Please login to run simulations".to_string()))
    );
    assert_eq!(
        dashboard
            .add_node("Chapel", Position::new(14.5995, 121.0112), 2.0, 1.0)
            .err(),
        Some(DashboardError::NotAuthenticated("Please login to add nodes".to_string()))
    );
    assert_eq!(
        dashboard.update_node(1, NodeUpdate::default()).err(),
        Some(DashboardError::NotAuthenticated("Please login to edit node data".to_string()))
    );
    assert_eq!(dashboard.nodes().len(), 15);
    assert_eq!(dashboard.revision(), 0);

    assert_eq!(dashboard.login("admin", "wrong"), Err(DashboardError::AccessDenied));
    dashboard.login("admin", "admin").expect("correct credentials");
    dashboard
        .start_hazard(Scenario::FlashFlood, 10.0, Intensity::High)
        .expect("operator may start hazards");
}
