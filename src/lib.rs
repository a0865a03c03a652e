pub mod alert;
pub mod auth;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod simulation;
pub mod snapshot;
pub mod stations;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use dashboard::{Dashboard, StateListener};
pub use model::{DashboardError, Intensity, Node, NodeId, Position, Scenario, ThresholdConfig};
pub use snapshot::{DashboardSnapshot, JsonStateFile};
pub use store::NodeUpdate;
