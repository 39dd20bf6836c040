//! Error taxonomy for building and running a simulation

use thiserror::Error;

use super::types::{RoadId, VehicleId};

/// Problems with the network description or run parameters.
///
/// All of these are detected before any simulation state changes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("road '{name}' must have a positive length (got {length})")]
    NonPositiveLength { name: String, length: f64 },
    #[error("road '{name}' must have a positive speed limit (got {limit})")]
    NonPositiveSpeedLimit { name: String, limit: f64 },
    #[error("road '{0}' is defined more than once")]
    DuplicateRoad(String),
    #[error("{context} refers to unknown road '{name}'")]
    UnknownRoad { context: String, name: String },
    #[error("{context} refers to unknown road id {id}")]
    DanglingRoadId { context: String, id: RoadId },
    #[error("road '{0}' already has an outgoing intersection")]
    DuplicateIntersection(String),
    #[error("vehicle {0} is defined more than once")]
    DuplicateVehicle(VehicleId),
    #[error("vehicle {id} has negative position {position}")]
    NegativePosition { id: VehicleId, position: f64 },
    #[error("vehicle {id} at {position} m lies beyond the end of road '{road}' ({length} m)")]
    PositionBeyondRoad {
        id: VehicleId,
        road: String,
        position: f64,
        length: f64,
    },
    #[error("vehicle {id} has invalid speed {speed}")]
    InvalidSpeed { id: VehicleId, speed: f64 },
    #[error("vehicle {id} has invalid desired speed {speed}")]
    InvalidDesiredSpeed { id: VehicleId, speed: f64 },
    #[error("traffic light on '{road}' has an invalid cycle: {reason}")]
    InvalidLightCycle { road: String, reason: String },
    #[error("inflow on '{road}' has invalid rate {rate}")]
    InvalidInflowRate { road: String, rate: f64 },
    #[error("inflow on '{road}' has invalid entry speed {speed}")]
    InvalidInflowSpeed { road: String, speed: f64 },
    #[error("time step must be positive and finite (got {0})")]
    InvalidTimeStep(f64),
    #[error("number of steps must be positive")]
    ZeroSteps,
}

/// Errors surfaced by the simulation engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// A logic bug: the state after a tick broke a structural invariant.
    #[error("invariant violated at tick {tick}: {detail}")]
    InvariantViolation { tick: u64, detail: String },
}
