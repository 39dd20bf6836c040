//! A one-dimensional road holding vehicles in position order
//!
//! Vehicles are kept sorted by ascending position; the front of the road is
//! the end of the Vec.

use ordered_float::OrderedFloat;

use super::types::{RoadId, VehicleId, MIN_ENTRY_GAP, VEHICLE_LENGTH};
use super::vehicle::Vehicle;

#[derive(Debug, Clone)]
pub struct Road {
    pub id: RoadId,
    pub name: String,
    /// Metres
    pub length: f64,
    /// Metres per second
    pub speed_limit: f64,
    vehicles: Vec<Vehicle>,
}

impl Road {
    pub fn new(id: RoadId, name: impl Into<String>, length: f64, speed_limit: f64) -> Self {
        Self {
            id,
            name: name.into(),
            length,
            speed_limit,
            vehicles: Vec::new(),
        }
    }

    /// Vehicles from the back of the road to the front
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.vehicles.iter().any(|v| v.id == id)
    }

    /// Place a vehicle at its own position, keeping the order.
    /// Among equal positions the new vehicle goes behind the existing ones.
    pub fn insert(&mut self, mut vehicle: Vehicle) {
        vehicle.current_road = self.id;
        vehicle.speed = vehicle.speed.min(self.speed_limit);
        let key = OrderedFloat(vehicle.position);
        let index = self
            .vehicles
            .partition_point(|v| OrderedFloat(v.position) < key);
        self.vehicles.insert(index, vehicle);
    }

    /// Put a vehicle arriving from an intersection at the very back
    pub fn admit_at_entry(&mut self, mut vehicle: Vehicle) {
        vehicle.enter_road(self.id, self.speed_limit);
        self.vehicles.insert(0, vehicle);
    }

    /// Whether a new vehicle fits at position 0
    pub fn entry_is_clear(&self) -> bool {
        self.vehicles
            .first()
            .is_none_or(|v| v.position >= MIN_ENTRY_GAP)
    }

    /// Advance every vehicle by `dt` with synchronous update semantics.
    ///
    /// Gaps are taken from the positions before the step, so each follower is
    /// clamped to one vehicle length behind where its leader was, never where
    /// it ends up.
    pub fn step(&mut self, dt: f64) {
        let old_positions: Vec<f64> = self.vehicles.iter().map(|v| v.position).collect();

        for index in (0..self.vehicles.len()).rev() {
            let gap = old_positions
                .get(index + 1)
                .map_or(f64::INFINITY, |leader| {
                    leader - old_positions[index] - VEHICLE_LENGTH
                });

            let vehicle = &mut self.vehicles[index];
            vehicle.advance(dt, self.speed_limit, gap);
            if vehicle.position > self.length {
                vehicle.position = self.length;
            }
        }

        if !self.is_sorted() {
            self.vehicles.sort_by_key(|v| OrderedFloat(v.position));
        }
    }

    fn is_sorted(&self) -> bool {
        self.vehicles
            .windows(2)
            .all(|pair| pair[0].position <= pair[1].position)
    }

    /// The front vehicle, if it has reached the end of the road
    pub fn vehicle_at_end(&self) -> Option<&Vehicle> {
        self.vehicles.last().filter(|v| v.position >= self.length)
    }

    /// Remove the front vehicle if it has reached the end of the road
    pub fn pop_vehicle_at_end(&mut self) -> Option<Vehicle> {
        if self.vehicle_at_end().is_some() {
            self.vehicles.pop()
        } else {
            None
        }
    }

    /// Hold every vehicle that has reached the end at the stop line
    pub fn hold_queue_at_end(&mut self) -> usize {
        let length = self.length;
        let mut held = 0;
        for vehicle in self.vehicles.iter_mut().rev() {
            if vehicle.position < length {
                break;
            }
            vehicle.hold_at_stop_line(length);
            held += 1;
        }
        held
    }

    /// Vehicles per kilometre
    pub fn density(&self) -> f64 {
        self.vehicles.len() as f64 / (self.length / 1000.0)
    }

    /// Fraction of the road covered by vehicle bodies, capped at 1
    pub fn occupancy(&self) -> f64 {
        (self.vehicles.len() as f64 * VEHICLE_LENGTH / self.length).min(1.0)
    }

    /// Mean speed of the vehicles on the road (0 when empty)
    pub fn mean_speed(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.speed_sum() / self.vehicles.len() as f64
    }

    pub fn speed_sum(&self) -> f64 {
        self.vehicles.iter().map(|v| v.speed).sum()
    }

    /// Describe the first broken road invariant, if any
    pub fn invariant_violation(&self) -> Option<String> {
        for vehicle in &self.vehicles {
            if !(0.0..=self.length).contains(&vehicle.position) {
                return Some(format!(
                    "vehicle {} at {} m outside road '{}' (0..={} m)",
                    vehicle.id, vehicle.position, self.name, self.length
                ));
            }
            if !(0.0..=self.speed_limit).contains(&vehicle.speed) {
                return Some(format!(
                    "vehicle {} speed {} outside 0..={} on road '{}'",
                    vehicle.id, vehicle.speed, self.speed_limit, self.name
                ));
            }
            if vehicle.current_road != self.id {
                return Some(format!(
                    "vehicle {} on road '{}' believes it is on {}",
                    vehicle.id, self.name, vehicle.current_road
                ));
            }
        }
        if !self.is_sorted() {
            return Some(format!("vehicles on road '{}' out of order", self.name));
        }
        None
    }
}
