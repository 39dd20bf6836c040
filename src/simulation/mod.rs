//! Discrete-time traffic simulation
//!
//! This module contains the simulation engine, the network it runs on and
//! the analysis of the statistics it records. It has no I/O beyond loading
//! a network description.

pub mod analyzer;
mod config;
mod engine;
mod error;
mod intersection;
mod road;
mod road_network;
mod stats;
mod traffic_light;
mod types;
mod vehicle;

pub use analyzer::{CongestionZone, GlobalStatistics, Grade, PerformanceReport, GRADE_TABLE};
pub use config::{
    InflowConfig, IntersectionConfig, LightConfig, NetworkConfig, RoadConfig, VehicleConfig,
};
pub use engine::{Inflow, SimulationEngine, DEFAULT_SEED};
pub use error::{ConfigError, SimError};
pub use intersection::{Intersection, RoutingPolicy};
pub use road::Road;
pub use road_network::{RoadNetwork, TransferOutcome};
pub use stats::{RoadStats, StatsSnapshot};
pub use traffic_light::{LightPhase, TrafficLight};
pub use types::{
    RoadId, VehicleId, DEFAULT_CONGESTION_THRESHOLD, JAM_DENSITY, MAX_ACCELERATION,
    MAX_DECELERATION, MIN_ENTRY_GAP, ROUTE_HISTORY_LIMIT, SAFE_FOLLOWING_GAP, VEHICLE_LENGTH,
};
pub use vehicle::Vehicle;
