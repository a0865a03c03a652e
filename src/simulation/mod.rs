//! The two competing writers of node readings and the hazard status view.
//!
//! Submodules:
//! - `drift`: periodic bounded random nudges.
//! - `hazard`: scripted, time-boxed scenario overrides.
//! - `status`: read-only hazard progress summaries.

pub mod drift;
pub mod hazard;
pub mod status;
