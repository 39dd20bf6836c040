//! Road network: roads, the intersections at their ends, and the graph
//! connecting them.
//!
//! Roads are addressed by `RoadId` (an index), intersections are keyed by
//! their source road, so nothing holds a reference to anything else.

use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::error::ConfigError;
use super::intersection::{Intersection, RoutingPolicy};
use super::road::Road;
use super::traffic_light::TrafficLight;
use super::types::{RoadId, VehicleId};
use super::vehicle::Vehicle;

/// What happened at the intersections during one transfer phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Vehicles moved onto a destination road
    pub transfers: usize,
    /// Vehicles that left the network
    pub exits: usize,
    /// Vehicles left waiting at the stop line
    pub held: usize,
}

/// The complete road network
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    roads: Vec<Road>,
    road_names: HashMap<String, RoadId>,

    /// Outgoing intersection keyed by source road (at most one per road)
    intersections: BTreeMap<RoadId, Intersection>,

    /// Road connectivity: one node per road, an edge per possible turn
    graph: DiGraph<RoadId, ()>,
    road_to_node: HashMap<RoadId, NodeIndex>,

    /// Smallest id guaranteed not to clash with any vehicle added so far
    next_vehicle_id: u64,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a road and return its id
    pub fn add_road(
        &mut self,
        name: impl Into<String>,
        length: f64,
        speed_limit: f64,
    ) -> Result<RoadId, ConfigError> {
        let name = name.into();
        if !(length.is_finite() && length > 0.0) {
            return Err(ConfigError::NonPositiveLength { name, length });
        }
        if !(speed_limit.is_finite() && speed_limit > 0.0) {
            return Err(ConfigError::NonPositiveSpeedLimit {
                name,
                limit: speed_limit,
            });
        }
        if self.road_names.contains_key(&name) {
            return Err(ConfigError::DuplicateRoad(name));
        }

        let id = RoadId(self.roads.len());
        let node = self.graph.add_node(id);
        self.road_to_node.insert(id, node);
        self.road_names.insert(name.clone(), id);
        self.roads.push(Road::new(id, name, length, speed_limit));
        Ok(id)
    }

    /// Look up a road by name, naming `context` in the error
    pub fn resolve(&self, name: &str, context: &str) -> Result<RoadId, ConfigError> {
        self.road_names
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownRoad {
                context: context.to_string(),
                name: name.to_string(),
            })
    }

    pub fn road_id(&self, name: &str) -> Option<RoadId> {
        self.road_names.get(name).copied()
    }

    /// Attach an intersection to the end of `source`
    pub fn add_intersection(
        &mut self,
        source: &str,
        destinations: &[&str],
        light: Option<TrafficLight>,
        policy: RoutingPolicy,
    ) -> Result<(), ConfigError> {
        let context = format!("intersection at the end of '{}'", source);
        let source_id = self.resolve(source, &context)?;
        let destination_ids = destinations
            .iter()
            .map(|name| self.resolve(name, &context))
            .collect::<Result<Vec<_>, _>>()?;

        if self.intersections.contains_key(&source_id) {
            return Err(ConfigError::DuplicateIntersection(source.to_string()));
        }

        let mut intersection = Intersection::new(source_id, destination_ids).with_policy(policy);
        if let Some(light) = light {
            intersection = intersection.with_light(light);
        }

        let source_node = self.road_to_node[&source_id];
        for destination in intersection.destinations() {
            let destination_node = self.road_to_node[destination];
            self.graph.add_edge(source_node, destination_node, ());
        }

        self.intersections.insert(source_id, intersection);
        Ok(())
    }

    /// Place a vehicle on a road at a given position
    pub fn add_vehicle(&mut self, road: &str, vehicle: Vehicle) -> Result<VehicleId, ConfigError> {
        let context = format!("vehicle {}", vehicle.id);
        let road_id = self.resolve(road, &context)?;
        self.place_vehicle(road_id, vehicle)
    }

    /// Place a vehicle on a road addressed by id
    pub fn place_vehicle(
        &mut self,
        road_id: RoadId,
        mut vehicle: Vehicle,
    ) -> Result<VehicleId, ConfigError> {
        let id = vehicle.id;
        let road = self
            .roads
            .get(road_id.0)
            .ok_or_else(|| ConfigError::DanglingRoadId {
                context: format!("vehicle {}", id),
                id: road_id,
            })?;

        if self.find_vehicle(id).is_some() {
            return Err(ConfigError::DuplicateVehicle(id));
        }
        if !(vehicle.position.is_finite() && vehicle.position >= 0.0) {
            return Err(ConfigError::NegativePosition {
                id,
                position: vehicle.position,
            });
        }
        if vehicle.position > road.length {
            return Err(ConfigError::PositionBeyondRoad {
                id,
                road: road.name.clone(),
                position: vehicle.position,
                length: road.length,
            });
        }
        if !(vehicle.speed.is_finite() && vehicle.speed >= 0.0) {
            return Err(ConfigError::InvalidSpeed {
                id,
                speed: vehicle.speed,
            });
        }
        // Infinity means "whatever the road allows"
        if vehicle.desired_speed.is_nan() || vehicle.desired_speed < 0.0 {
            return Err(ConfigError::InvalidDesiredSpeed {
                id,
                speed: vehicle.desired_speed,
            });
        }

        vehicle.route_history = VecDeque::from([road_id]);
        self.roads[road_id.0].insert(vehicle);
        self.next_vehicle_id = self.next_vehicle_id.max(id.0 + 1);
        Ok(id)
    }

    /// The smallest id no vehicle in this network has used yet.
    /// It is only consumed once a vehicle with that id is placed.
    pub fn next_vehicle_id(&self) -> VehicleId {
        VehicleId(self.next_vehicle_id)
    }

    /// Check that every intersection refers to roads that exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (source, intersection) in &self.intersections {
            let context = format!("intersection at the end of {}", source);
            for id in std::iter::once(source).chain(intersection.destinations()) {
                if self.roads.get(id.0).is_none() {
                    return Err(ConfigError::DanglingRoadId {
                        context: context.clone(),
                        id: *id,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id.0)
    }

    pub fn road_by_name(&self, name: &str) -> Option<&Road> {
        self.road_id(name).and_then(|id| self.road(id))
    }

    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    /// The intersection at the end of `road`, if any
    pub fn intersection(&self, road: RoadId) -> Option<&Intersection> {
        self.intersections.get(&road)
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn total_vehicles(&self) -> usize {
        self.roads.iter().map(Road::vehicle_count).sum()
    }

    /// Unweighted mean of road densities (vehicles/km)
    pub fn mean_density(&self) -> f64 {
        if self.roads.is_empty() {
            return 0.0;
        }
        self.roads.iter().map(Road::density).sum::<f64>() / self.roads.len() as f64
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.roads.iter().flat_map(|road| road.vehicles().iter())
    }

    pub fn find_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles().find(|v| v.id == id)
    }

    /// A road is terminal when vehicles reaching its end leave the network
    pub fn is_terminal(&self, road: RoadId) -> bool {
        self.intersections
            .get(&road)
            .is_none_or(Intersection::is_exit)
    }

    /// Every road reachable from `road` by following intersections,
    /// excluding `road` itself unless it lies on a loop
    pub fn downstream_roads(&self, road: RoadId) -> Vec<RoadId> {
        let Some(&start) = self.road_to_node.get(&road) else {
            return Vec::new();
        };

        let mut reached = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(node) = bfs.next(&self.graph) {
            if node != start {
                reached.push(self.graph[node]);
            }
        }

        let loops_back = self
            .graph
            .neighbors_directed(start, petgraph::Direction::Incoming)
            .any(|node| node == start || reached.contains(&self.graph[node]));
        if loops_back {
            reached.push(road);
        }

        reached.sort();
        reached
    }

    /// Roads from which no terminal road can be reached; vehicles entering
    /// them circulate forever
    pub fn roads_without_exit(&self) -> Vec<RoadId> {
        let terminals: HashSet<RoadId> = self
            .roads
            .iter()
            .map(|road| road.id)
            .filter(|id| self.is_terminal(*id))
            .collect();

        self.roads
            .iter()
            .map(|road| road.id)
            .filter(|id| {
                !terminals.contains(id)
                    && !self
                        .downstream_roads(*id)
                        .iter()
                        .any(|downstream| terminals.contains(downstream))
            })
            .collect()
    }

    /// Phase 1: advance every traffic light
    pub(crate) fn tick_lights(&mut self, dt: f64) {
        for intersection in self.intersections.values_mut() {
            intersection.tick_light(dt);
        }
    }

    /// Phase 2: vehicle kinematics on every road
    pub(crate) fn advance_vehicles(&mut self, dt: f64) {
        for road in &mut self.roads {
            road.step(dt);
        }
    }

    /// Phase 3: move vehicles that reached the end of their road.
    ///
    /// Roads are visited in id order. Light phases are the ones already
    /// advanced in phase 1. A vehicle whose destination entry is occupied
    /// waits at the stop line and keeps its turn in the rotation.
    pub(crate) fn resolve_transfers(&mut self) -> TransferOutcome {
        let mut outcome = TransferOutcome::default();

        for index in 0..self.roads.len() {
            let source = RoadId(index);
            let Some(intersection) = self.intersections.get_mut(&source) else {
                while let Some(vehicle) = self.roads[index].pop_vehicle_at_end() {
                    debug!(
                        "vehicle {} left the network at the end of '{}'",
                        vehicle.id, self.roads[index].name
                    );
                    outcome.exits += 1;
                }
                continue;
            };

            if !intersection.allows_transfer() {
                outcome.held += self.roads[index].hold_queue_at_end();
                continue;
            }

            while self.roads[index].vehicle_at_end().is_some() {
                let Some(destination) = intersection.peek_destination() else {
                    if let Some(vehicle) = self.roads[index].pop_vehicle_at_end() {
                        debug!("vehicle {} exited at '{}'", vehicle.id, self.roads[index].name);
                        outcome.exits += 1;
                    }
                    continue;
                };

                if !self.roads[destination.0].entry_is_clear() {
                    outcome.held += self.roads[index].hold_queue_at_end();
                    break;
                }

                if let Some(vehicle) = self.roads[index].pop_vehicle_at_end() {
                    debug!(
                        "vehicle {} turned from '{}' onto '{}'",
                        vehicle.id, self.roads[index].name, self.roads[destination.0].name
                    );
                    intersection.record_crossing();
                    self.roads[destination.0].admit_at_entry(vehicle);
                    outcome.transfers += 1;
                }
            }
        }

        outcome
    }

    /// Describe the first broken structural invariant, if any
    pub fn invariant_violation(&self) -> Option<String> {
        for road in &self.roads {
            if let Some(detail) = road.invariant_violation() {
                return Some(detail);
            }
        }
        for intersection in self.intersections.values() {
            if let Some(detail) = intersection
                .light
                .as_ref()
                .and_then(TrafficLight::invariant_violation)
            {
                return Some(format!("{} (at the end of {})", detail, intersection.source));
            }
        }

        let mut seen = HashSet::new();
        for vehicle in self.vehicles() {
            if !seen.insert(vehicle.id) {
                return Some(format!("vehicle {} appears twice in the network", vehicle.id));
            }
        }
        None
    }
}
