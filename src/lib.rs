//! Environmental-health monitoring simulation.
//!
//! Generates synthetic water-quality readings and public toilet usage
//! counters, classifies water safety, keeps bounded per-entity histories for
//! charting, and raises an event whenever a water body newly turns
//! contaminated.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod registry;
pub mod simulate;
