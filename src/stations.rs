/// Seed node registry, the "fresh install" starting network.
///
/// Defines the canonical list of sensor sites the dashboard starts with when
/// no persisted state exists, along with their coordinates and opening
/// readings. Ids here are the ids the store assigns on a fresh start, so
/// everything downstream (persisted snapshots, test fixtures) can refer to
/// them by number.

use crate::model::{Node, NodeId, Position};

// ---------------------------------------------------------------------------
// Seed metadata
// ---------------------------------------------------------------------------

/// Metadata for a single seed sensor site.
pub struct SeedStation {
    pub id: NodeId,
    /// Site name shown on the map popup and simulation table.
    pub name: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Opening water level, in meters.
    pub water_level: f64,
    /// Opening flow rate, in meters per second.
    pub water_flow: f64,
}

impl SeedStation {
    pub fn to_node(&self) -> Node {
        Node {
            id: self.id,
            name: self.name.to_string(),
            position: Position::new(self.latitude, self.longitude),
            water_level: self.water_level,
            water_flow: self.water_flow,
        }
    }
}

/// Map center used by the view layer, the main gate sensor.
pub const MAP_CENTER: (f64, f64) = (14.599163, 121.01187);

/// All seed sites, in the order the store lists them.
pub static SEED_REGISTRY: &[SeedStation] = &[
    SeedStation { id: 1, name: "PUP Main Gate", latitude: 14.599163, longitude: 121.01187, water_level: 3.2, water_flow: 1.5 },
    SeedStation { id: 2, name: "South Wing", latitude: 14.598463, longitude: 121.01217, water_level: 4.8, water_flow: 2.1 },
    SeedStation { id: 3, name: "North Wing", latitude: 14.599863, longitude: 121.01157, water_level: 6.2, water_flow: 3.4 },
    SeedStation { id: 4, name: "East Campus", latitude: 14.598663, longitude: 121.01247, water_level: 2.9, water_flow: 1.2 },
    SeedStation { id: 5, name: "West Campus", latitude: 14.599463, longitude: 121.01097, water_level: 5.5, water_flow: 2.8 },
    SeedStation { id: 6, name: "Library Area", latitude: 14.598763, longitude: 121.01187, water_level: 3.8, water_flow: 1.8 },
    SeedStation { id: 7, name: "Gymnasium", latitude: 14.600163, longitude: 121.01207, water_level: 4.2, water_flow: 2.0 },
    SeedStation { id: 8, name: "Covered Courts", latitude: 14.598163, longitude: 121.01147, water_level: 5.8, water_flow: 0.6 },
    SeedStation { id: 9, name: "Engineering Bldg", latitude: 14.599363, longitude: 121.01227, water_level: 3.5, water_flow: 1.6 },
    SeedStation { id: 10, name: "Business Bldg", latitude: 14.599663, longitude: 121.01167, water_level: 4.5, water_flow: 2.2 },
    SeedStation { id: 11, name: "Science Complex", latitude: 14.598563, longitude: 121.01207, water_level: 6.5, water_flow: 3.2 },
    SeedStation { id: 12, name: "Arts Building", latitude: 14.598963, longitude: 121.01107, water_level: 3.0, water_flow: 1.4 },
    SeedStation { id: 13, name: "Student Center", latitude: 14.600063, longitude: 121.01187, water_level: 5.2, water_flow: 2.5 },
    SeedStation { id: 14, name: "Sports Complex", latitude: 14.598863, longitude: 121.01177, water_level: 4.0, water_flow: 0.8 },
    SeedStation { id: 15, name: "Admin Building", latitude: 14.599563, longitude: 121.01137, water_level: 3.7, water_flow: 1.7 },
];

/// Builds the seed node list in registry order.
pub fn seed_nodes() -> Vec<Node> {
    SEED_REGISTRY.iter().map(SeedStation::to_node).collect()
}

/// Looks up a seed site by id. Returns `None` if not found.
pub fn find_seed(id: NodeId) -> Option<&'static SeedStation> {
    SEED_REGISTRY.iter().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
