//! Reductions over a snapshot history
//!
//! Everything here is a pure function of the history slice. An empty history
//! is a valid input and yields zeroed results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::stats::StatsSnapshot;
use super::types::{RoadId, DEFAULT_CONGESTION_THRESHOLD};

/// Aggregates over a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub snapshot_count: usize,
    /// Mean over every vehicle observation in every snapshot
    pub mean_speed: f64,
    /// Mean of the per-snapshot mean road density
    pub mean_density: f64,
    pub max_density: f64,
    pub max_vehicles: usize,
    pub min_vehicles: usize,
    pub mean_vehicles: f64,
    pub mean_congestion: f64,
    pub max_congestion: f64,
}

/// A road whose density went over the threshold at least once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionZone {
    pub road_id: RoadId,
    pub name: String,
    /// Fraction of snapshots in which the road was over the threshold
    pub congestion_fraction: f64,
    pub peak_density: f64,
    pub mean_density: f64,
}

/// Qualitative network grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    /// The history was empty
    NoData,
}

/// Upper bounds (exclusive) on the mean congestion index for each grade.
/// Anything at or above the last bound is `Critical`.
pub const GRADE_TABLE: [(f64, Grade); 4] = [
    (20.0, Grade::Excellent),
    (40.0, Grade::Good),
    (60.0, Grade::Fair),
    (80.0, Grade::Poor),
];

impl Grade {
    pub fn from_congestion(mean_congestion: f64) -> Self {
        GRADE_TABLE
            .iter()
            .find(|(bound, _)| mean_congestion < *bound)
            .map_or(Grade::Critical, |(_, grade)| *grade)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Fair => "Fair",
            Grade::Poor => "Poor",
            Grade::Critical => "Critical",
            Grade::NoData => "No data",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub global: GlobalStatistics,
    pub mean_speed: f64,
    pub mean_congestion: f64,
    /// Fraction of snapshots in which at least one road was congested
    pub congestion_frequency: f64,
    /// 100 minus the mean congestion index
    pub efficiency: f64,
    pub grade: Grade,
    pub congestion_zones: Vec<CongestionZone>,
    pub recommendations: Vec<String>,
}

pub fn global_statistics(history: &[StatsSnapshot]) -> GlobalStatistics {
    if history.is_empty() {
        return GlobalStatistics::default();
    }
    let count = history.len() as f64;

    let vehicle_observations: usize = history.iter().map(|s| s.total_vehicles).sum();
    let speed_sum: f64 = history
        .iter()
        .flat_map(|s| s.roads.iter())
        .map(|r| r.speed_sum)
        .sum();
    let mean_speed = if vehicle_observations == 0 {
        0.0
    } else {
        speed_sum / vehicle_observations as f64
    };

    GlobalStatistics {
        snapshot_count: history.len(),
        mean_speed,
        mean_density: history.iter().map(|s| s.mean_density).sum::<f64>() / count,
        max_density: history
            .iter()
            .flat_map(|s| s.roads.iter())
            .map(|r| r.density)
            .fold(0.0, f64::max),
        max_vehicles: history.iter().map(|s| s.total_vehicles).max().unwrap_or(0),
        min_vehicles: history.iter().map(|s| s.total_vehicles).min().unwrap_or(0),
        mean_vehicles: vehicle_observations as f64 / count,
        mean_congestion: history.iter().map(|s| s.congestion_index).sum::<f64>() / count,
        max_congestion: history
            .iter()
            .map(|s| s.congestion_index)
            .fold(0.0, f64::max),
    }
}

#[derive(Default)]
struct ZoneTally {
    name: String,
    over_threshold: usize,
    observed: usize,
    density_sum: f64,
    peak_density: f64,
}

/// Roads whose density exceeded `threshold` (vehicles/km) in at least one
/// snapshot, most often congested first
pub fn congestion_zones(history: &[StatsSnapshot], threshold: f64) -> Vec<CongestionZone> {
    let mut tallies: BTreeMap<RoadId, ZoneTally> = BTreeMap::new();

    for snapshot in history {
        for road in &snapshot.roads {
            let tally = tallies.entry(road.road_id).or_default();
            if tally.name.is_empty() {
                tally.name = road.name.clone();
            }
            tally.observed += 1;
            tally.density_sum += road.density;
            tally.peak_density = tally.peak_density.max(road.density);
            if road.density > threshold {
                tally.over_threshold += 1;
            }
        }
    }

    let total = history.len() as f64;
    let mut zones: Vec<CongestionZone> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.over_threshold > 0)
        .map(|(road_id, tally)| CongestionZone {
            road_id,
            name: tally.name,
            congestion_fraction: tally.over_threshold as f64 / total,
            peak_density: tally.peak_density,
            mean_density: tally.density_sum / tally.observed as f64,
        })
        .collect();

    zones.sort_by(|a, b| {
        b.congestion_fraction
            .total_cmp(&a.congestion_fraction)
            .then(a.road_id.cmp(&b.road_id))
    });
    zones
}

/// Fraction of snapshots in which any road was over `threshold`
pub fn congestion_frequency(history: &[StatsSnapshot], threshold: f64) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let congested = history
        .iter()
        .filter(|s| s.roads.iter().any(|r| r.density > threshold))
        .count();
    congested as f64 / history.len() as f64
}

/// Seconds needed to cover `distance` metres at the global mean speed.
/// None when nothing moved.
pub fn mean_travel_time(history: &[StatsSnapshot], distance: f64) -> Option<f64> {
    let mean_speed = global_statistics(history).mean_speed;
    (mean_speed > 0.0).then(|| distance / mean_speed)
}

pub fn performance_report(history: &[StatsSnapshot]) -> PerformanceReport {
    performance_report_with_threshold(history, DEFAULT_CONGESTION_THRESHOLD)
}

pub fn performance_report_with_threshold(
    history: &[StatsSnapshot],
    threshold: f64,
) -> PerformanceReport {
    let global = global_statistics(history);
    let zones = congestion_zones(history, threshold);
    let grade = if history.is_empty() {
        Grade::NoData
    } else {
        Grade::from_congestion(global.mean_congestion)
    };

    PerformanceReport {
        mean_speed: global.mean_speed,
        mean_congestion: global.mean_congestion,
        congestion_frequency: congestion_frequency(history, threshold),
        efficiency: (100.0 - global.mean_congestion).max(0.0),
        grade,
        recommendations: recommendations(&zones, history.is_empty()),
        congestion_zones: zones,
        global,
    }
}

fn recommendations(zones: &[CongestionZone], no_data: bool) -> Vec<String> {
    if no_data {
        return vec!["No snapshots recorded; run the simulation first".to_string()];
    }
    if zones.is_empty() {
        return vec!["Network is operating without congestion".to_string()];
    }

    let mut lines = Vec::new();
    if zones.len() > 3 {
        lines.push(format!(
            "{} roads are congested; consider alternative routes or retiming lights",
            zones.len()
        ));
    }
    for zone in zones.iter().take(3) {
        lines.push(format!(
            "Road '{}' congested in {:.0}% of ticks (peak {:.1} veh/km)",
            zone.name,
            zone.congestion_fraction * 100.0,
            zone.peak_density
        ));
    }
    lines
}
