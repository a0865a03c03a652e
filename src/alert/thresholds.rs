//! Threshold crossing checks.
//!
//! Alerts are edge-triggered: they fire on the observation that crosses
//! *into* the undesirable region, never while a node stays there and never
//! on the way out. Evaluation is pure; callers append the resulting events
//! to the notification log themselves.

use crate::model::{Node, NodeId, ThresholdConfig};

/// What a node looked like at the previous observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub name: String,
    pub water_level: f64,
    pub water_flow: f64,
}

impl Observation {
    pub fn of(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            water_level: node.water_level,
            water_flow: node.water_flow,
        }
    }
}

/// An alert raised by a single evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    /// Water level rose above the critical threshold.
    LevelCritical { node_id: NodeId, name: String, level: f64 },
    /// Flow rate dropped below the low-flow threshold.
    FlowLow { node_id: NodeId, name: String, flow: f64 },
    /// Operator changed the node's name.
    Renamed { node_id: NodeId, from: String, to: String },
}

impl AlertEvent {
    pub fn node_id(&self) -> NodeId {
        match self {
            AlertEvent::LevelCritical { node_id, .. }
            | AlertEvent::FlowLow { node_id, .. }
            | AlertEvent::Renamed { node_id, .. } => *node_id,
        }
    }

    /// Operator-facing notification text.
    pub fn message(&self) -> String {
        match self {
            AlertEvent::LevelCritical { name, level, .. } => {
                format!("{} reached critical level ({:.1}m)", name, level)
            }
            AlertEvent::FlowLow { name, flow, .. } => {
                format!("{} flow rate dropped below threshold ({:.1}m/s)", name, flow)
            }
            AlertEvent::Renamed { from, to, .. } => {
                format!("Node renamed from \"{}\" to \"{}\"", from, to)
            }
        }
    }
}

/// `old <= threshold < new`
pub fn crossed_above(old: f64, new: f64, threshold: f64) -> bool {
    old <= threshold && threshold < new
}

/// `old >= threshold > new`
pub fn crossed_below(old: f64, new: f64, threshold: f64) -> bool {
    old >= threshold && threshold > new
}

/// Compares `node` against its previous observation and returns the alerts
/// that fire, in level, flow, rename order.
pub fn evaluate(node: &Node, previous: &Observation, config: &ThresholdConfig) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    if config.level_warnings_enabled
        && crossed_above(previous.water_level, node.water_level, config.level_threshold)
    {
        events.push(AlertEvent::LevelCritical {
            node_id: node.id,
            name: node.name.clone(),
            level: node.water_level,
        });
    }

    if config.flow_warnings_enabled
        && crossed_below(previous.water_flow, node.water_flow, config.flow_threshold)
    {
        events.push(AlertEvent::FlowLow {
            node_id: node.id,
            name: node.name.clone(),
            flow: node.water_flow,
        });
    }

    if previous.name != node.name {
        events.push(AlertEvent::Renamed {
            node_id: node.id,
            from: previous.name.clone(),
            to: node.name.clone(),
        });
    }

    events
}
