//! Node store: the single authoritative owner of node readings.
//!
//! Every other component reads and writes nodes through here. Nodes are kept
//! in insertion order; ids are assigned as `max(existing) + 1`, never reused
//! while a higher id is present.

use std::collections::BTreeSet;

use crate::logging::{self, Component};
use crate::model::{Node, NodeId, Position, Reading};

/// Partial update for a node. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub water_level: Option<f64>,
    pub water_flow: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an existing node list (seed registry or snapshot),
    /// keeping its order and ids.
    ///
    /// Readings are clamped into range. A repeated id keeps the first node;
    /// later ones are dropped with a warning.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut seen = BTreeSet::new();
        let mut kept = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            if !seen.insert(node.id) {
                logging::warn(
                    Component::Persist,
                    Some(&format!("node {}", node.id)),
                    &format!("duplicate id, dropping \"{}\"", node.name),
                );
                continue;
            }
            node.set_reading(Reading::clamped(node.water_level, node.water_flow));
            kept.push(node);
        }
        Self { nodes: kept }
    }

    /// Id the next `add` will assign: `max + 1`, or the lowest free id once
    /// `max` is `NodeId::MAX`.
    pub fn next_id(&self) -> NodeId {
        match self.nodes.iter().map(|n| n.id).max() {
            None => 1,
            Some(max) => max
                .checked_add(1)
                .unwrap_or_else(|| (1..NodeId::MAX).find(|id| !self.contains(*id)).unwrap_or(0)),
        }
    }

    pub fn add(&mut self, name: &str, position: Position, reading: Reading) -> Node {
        let node = Node {
            id: self.next_id(),
            name: name.to_string(),
            position,
            water_level: reading.water_level,
            water_flow: reading.water_flow,
        };
        self.nodes.push(node.clone());
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Applies `update` in place. Unknown ids are ignored; callers check
    /// with [`NodeStore::contains`] first when they need to refuse.
    ///
    /// Reading fields are assumed validated; they are still clamped so the
    /// range invariant holds for every stored node.
    pub fn update(&mut self, id: NodeId, update: NodeUpdate) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        if let Some(name) = update.name {
            node.name = name;
        }
        let level = update.water_level.unwrap_or(node.water_level);
        let flow = update.water_flow.unwrap_or(node.water_flow);
        node.set_reading(Reading::clamped(level, flow));
    }

    /// Deletes a node, handing it back so view state keyed by its id can
    /// be dropped too.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        Some(self.nodes.remove(index))
    }

    /// Nodes in insertion order.
    pub fn list(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
