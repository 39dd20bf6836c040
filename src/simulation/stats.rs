//! Per-tick statistics snapshots

use serde::{Deserialize, Serialize};

use super::road::Road;
use super::road_network::{RoadNetwork, TransferOutcome};
use super::types::{RoadId, JAM_DENSITY};

/// Statistics for one road at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadStats {
    pub road_id: RoadId,
    pub name: String,
    pub vehicle_count: usize,
    /// Sum of vehicle speeds, kept so means can be weighted by vehicle count
    pub speed_sum: f64,
    pub mean_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Vehicles per kilometre
    pub density: f64,
    pub occupancy: f64,
    pub speed_limit: f64,
    pub length: f64,
}

impl RoadStats {
    pub fn from_road(road: &Road) -> Self {
        let speeds = road.vehicles().iter().map(|v| v.speed);
        let (min_speed, max_speed) = if road.is_empty() {
            (0.0, 0.0)
        } else {
            speeds.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s), hi.max(s))
            })
        };

        Self {
            road_id: road.id,
            name: road.name.clone(),
            vehicle_count: road.vehicle_count(),
            speed_sum: road.speed_sum(),
            mean_speed: road.mean_speed(),
            min_speed,
            max_speed,
            density: road.density(),
            occupancy: road.occupancy(),
            speed_limit: road.speed_limit,
            length: road.length,
        }
    }

    /// Congestion index between 0 (free flow) and 100 (jammed).
    ///
    /// The larger of the density score (density relative to `JAM_DENSITY`)
    /// and the speed score (how far the mean speed sits below the limit).
    /// An empty road only has a density score.
    pub fn congestion_index(&self) -> f64 {
        let density_score = (self.density / JAM_DENSITY * 100.0).min(100.0);
        let speed_score = if self.vehicle_count == 0 {
            0.0
        } else {
            let reduction = (self.speed_limit - self.mean_speed).max(0.0);
            (reduction / self.speed_limit * 100.0).min(100.0)
        };
        density_score.max(speed_score)
    }
}

/// Immutable record of the network at the end of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Zero-based tick index
    pub tick: u64,
    /// Simulated seconds at the end of the tick
    pub time: f64,
    pub roads: Vec<RoadStats>,
    pub total_vehicles: usize,
    /// Mean over all vehicles in the network (0 when there are none)
    pub mean_speed: f64,
    /// Unweighted mean of road densities
    pub mean_density: f64,
    /// Mean of road congestion indices
    pub congestion_index: f64,
    pub transfers: usize,
    pub exits: usize,
    pub injected: usize,
}

impl StatsSnapshot {
    pub fn capture(
        tick: u64,
        time: f64,
        network: &RoadNetwork,
        outcome: TransferOutcome,
        injected: usize,
    ) -> Self {
        let roads: Vec<RoadStats> = network.roads().iter().map(RoadStats::from_road).collect();

        let total_vehicles: usize = roads.iter().map(|r| r.vehicle_count).sum();
        let speed_sum: f64 = roads.iter().map(|r| r.speed_sum).sum();
        let mean_speed = if total_vehicles == 0 {
            0.0
        } else {
            speed_sum / total_vehicles as f64
        };
        let (mean_density, congestion_index) = if roads.is_empty() {
            (0.0, 0.0)
        } else {
            let n = roads.len() as f64;
            (
                roads.iter().map(|r| r.density).sum::<f64>() / n,
                roads.iter().map(RoadStats::congestion_index).sum::<f64>() / n,
            )
        };

        Self {
            tick,
            time,
            roads,
            total_vehicles,
            mean_speed,
            mean_density,
            congestion_index,
            transfers: outcome.transfers,
            exits: outcome.exits,
            injected,
        }
    }

    pub fn road(&self, road_id: RoadId) -> Option<&RoadStats> {
        self.roads.iter().find(|r| r.road_id == road_id)
    }

    pub fn road_by_name(&self, name: &str) -> Option<&RoadStats> {
        self.roads.iter().find(|r| r.name == name)
    }
}
