//! Vehicle kinematics for the traffic simulation
//!
//! A vehicle only knows its own speed and position; the road it is on
//! supplies the speed limit and the gap to the vehicle ahead.

use std::collections::VecDeque;

use super::types::{
    RoadId, VehicleId, MAX_ACCELERATION, MAX_DECELERATION, ROUTE_HISTORY_LIMIT,
    SAFE_FOLLOWING_GAP,
};

/// A vehicle in the traffic simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Metres along the current road
    pub position: f64,
    /// Metres per second
    pub speed: f64,
    pub current_road: RoadId,
    /// Cruise speed the driver aims for when the road allows it
    pub desired_speed: f64,
    /// The last `ROUTE_HISTORY_LIMIT` roads this vehicle has been on,
    /// oldest first
    pub route_history: VecDeque<RoadId>,
}

impl Vehicle {
    /// Create a vehicle that cruises at whatever speed limit it meets
    pub fn new(id: VehicleId, current_road: RoadId, position: f64, speed: f64) -> Self {
        Self {
            id,
            position,
            speed,
            current_road,
            desired_speed: f64::INFINITY,
            route_history: VecDeque::from([current_road]),
        }
    }

    pub fn with_desired_speed(mut self, desired_speed: f64) -> Self {
        self.desired_speed = desired_speed;
        self
    }

    /// Speed the vehicle steers toward given the road limit and the free
    /// space ahead. Below the safe gap the target shrinks linearly to zero.
    pub fn target_speed(&self, speed_limit: f64, gap_to_leader: f64) -> f64 {
        let cruise = self.desired_speed.min(speed_limit);
        if gap_to_leader < SAFE_FOLLOWING_GAP {
            cruise * (gap_to_leader / SAFE_FOLLOWING_GAP).max(0.0)
        } else {
            cruise
        }
    }

    /// Advance the vehicle by `dt` seconds.
    ///
    /// Speed moves toward the target bounded by the acceleration limits, then
    /// the position moves by `speed * dt` but never beyond `gap_to_leader`.
    /// A leaderless vehicle passes `f64::INFINITY`.
    pub fn advance(&mut self, dt: f64, speed_limit: f64, gap_to_leader: f64) {
        let target = self.target_speed(speed_limit, gap_to_leader);

        let next_speed = if target >= self.speed {
            (self.speed + MAX_ACCELERATION * dt).min(target)
        } else {
            (self.speed - MAX_DECELERATION * dt).max(target)
        };
        self.speed = next_speed.clamp(0.0, speed_limit);

        let mut distance = self.speed * dt;
        let room = gap_to_leader.max(0.0);
        if distance > room {
            // No passing: stop at the leader and report the speed actually achieved
            distance = room;
            self.speed = self.speed.min(distance / dt);
        }

        self.position += distance;
    }

    /// Move onto a new road at its entry point
    pub fn enter_road(&mut self, road: RoadId, speed_limit: f64) {
        self.current_road = road;
        self.position = 0.0;
        self.speed = self.speed.min(speed_limit);
        while self.route_history.len() >= ROUTE_HISTORY_LIMIT {
            self.route_history.pop_front();
        }
        self.route_history.push_back(road);
    }

    /// Wait at the end of the road for a light or a free destination
    pub fn hold_at_stop_line(&mut self, road_length: f64) {
        self.position = road_length;
        self.speed = 0.0;
    }
}
