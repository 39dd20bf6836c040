//! Core types for the traffic simulation
//!
//! Identifiers and the kinematic constants shared by roads and vehicles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a road inside its `RoadNetwork`
/// Roads are stored in a Vec so the id doubles as the slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoadId(pub usize);

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road #{}", self.0)
    }
}

/// A vehicle identifier, unique within a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Length of a vehicle in metres; followers keep at least this far behind
/// their leader
pub const VEHICLE_LENGTH: f64 = 5.0;

/// Minimum free space at a road entry before another vehicle may be injected
pub const MIN_ENTRY_GAP: f64 = VEHICLE_LENGTH;

/// Gap to the leader (metres) below which a follower starts slowing down
pub const SAFE_FOLLOWING_GAP: f64 = 20.0;

/// Maximum acceleration in m/s²
pub const MAX_ACCELERATION: f64 = 2.5;

/// Maximum deceleration in m/s² (positive magnitude)
pub const MAX_DECELERATION: f64 = 6.0;

/// Number of most recent roads a vehicle remembers in its route history
pub const ROUTE_HISTORY_LIMIT: usize = 32;

/// Density (vehicles/km) at which a road's congestion index saturates
pub const JAM_DENSITY: f64 = 50.0;

/// Default density threshold (vehicles/km) for flagging a congested road
pub const DEFAULT_CONGESTION_THRESHOLD: f64 = 30.0;
