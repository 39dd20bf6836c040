//! Intersection routing for the traffic simulation
//!
//! An intersection hangs off the end of one source road and hands vehicles
//! to one of its destination roads, optionally gated by a traffic light.

use serde::{Deserialize, Serialize};

use super::traffic_light::TrafficLight;
use super::types::RoadId;

/// How an intersection picks the destination for the next vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Cycle through the destinations in configured order
    #[default]
    RoundRobin,
    /// Always send vehicles to the first configured destination
    First,
}

/// An intersection at the end of `source`
#[derive(Debug, Clone)]
pub struct Intersection {
    pub source: RoadId,
    destinations: Vec<RoadId>,
    pub light: Option<TrafficLight>,
    pub policy: RoutingPolicy,
    /// Index of the destination the next round-robin pick will use
    next_destination: usize,
}

impl Intersection {
    /// Create an intersection; repeated destinations are dropped, keeping the
    /// first occurrence
    pub fn new(source: RoadId, destinations: Vec<RoadId>) -> Self {
        let mut unique = Vec::with_capacity(destinations.len());
        for destination in destinations {
            if !unique.contains(&destination) {
                unique.push(destination);
            }
        }

        Self {
            source,
            destinations: unique,
            light: None,
            policy: RoutingPolicy::default(),
            next_destination: 0,
        }
    }

    pub fn with_light(mut self, light: TrafficLight) -> Self {
        self.light = Some(light);
        self
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn destinations(&self) -> &[RoadId] {
        &self.destinations
    }

    /// A vehicle at the end of the source road leaves the network here
    pub fn is_exit(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Vehicles may cross when there is no light or the light is green
    pub fn allows_transfer(&self) -> bool {
        self.light.as_ref().is_none_or(TrafficLight::is_green)
    }

    pub fn tick_light(&mut self, dt: f64) {
        if let Some(light) = &mut self.light {
            light.tick(dt);
        }
    }

    /// The destination the next crossing vehicle would take, without
    /// committing to it. None when the intersection has no destinations.
    pub fn peek_destination(&self) -> Option<RoadId> {
        if self.destinations.is_empty() {
            return None;
        }

        match self.policy {
            RoutingPolicy::First => Some(self.destinations[0]),
            RoutingPolicy::RoundRobin => {
                Some(self.destinations[self.next_destination % self.destinations.len()])
            }
        }
    }

    /// Record that a vehicle crossed toward the peeked destination
    pub fn record_crossing(&mut self) {
        if self.policy == RoutingPolicy::RoundRobin && !self.destinations.is_empty() {
            self.next_destination = (self.next_destination + 1) % self.destinations.len();
        }
    }

    /// Pick the destination for the next crossing vehicle and commit to it
    pub fn select_destination(&mut self) -> Option<RoadId> {
        let chosen = self.peek_destination();
        self.record_crossing();
        chosen
    }
}
