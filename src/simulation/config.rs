//! Network description files
//!
//! A JSON document lists roads, intersections, initial vehicles and optional
//! inflows. Road references are resolved by name while building, so unknown
//! names are rejected before a simulation can start.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::ConfigError;
use super::intersection::RoutingPolicy;
use super::road_network::RoadNetwork;
use super::traffic_light::{LightPhase, TrafficLight};
use super::types::VehicleId;
use super::vehicle::Vehicle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadConfig {
    pub name: String,
    /// Metres
    pub length: f64,
    /// Metres per second
    pub speed_limit: f64,
}

/// Light timing, either explicit or red/green/amber of equal length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LightConfig {
    Cycle { cycle: Vec<(LightPhase, f64)> },
    Uniform { uniform: f64 },
}

impl LightConfig {
    pub fn build(&self, road: &str) -> Result<TrafficLight, ConfigError> {
        let light = match self {
            LightConfig::Cycle { cycle } => TrafficLight::new(cycle.clone()),
            LightConfig::Uniform { uniform } => TrafficLight::uniform(*uniform),
        };
        light.map_err(|reason| ConfigError::InvalidLightCycle {
            road: road.to_string(),
            reason,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionConfig {
    pub source: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub light: Option<LightConfig>,
    #[serde(default)]
    pub policy: RoutingPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub id: u64,
    pub road: String,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub desired_speed: Option<f64>,
}

/// Random arrivals at the entry of a road
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflowConfig {
    pub road: String,
    /// Expected vehicles per second
    pub rate: f64,
    /// Entry speed; defaults to the road's speed limit
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub roads: Vec<RoadConfig>,
    #[serde(default)]
    pub intersections: Vec<IntersectionConfig>,
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,
    #[serde(default)]
    pub inflows: Vec<InflowConfig>,
}

impl NetworkConfig {
    /// Read a JSON network description from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read network file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse network file {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve every name and build the in-memory network
    pub fn build_network(&self) -> Result<RoadNetwork, ConfigError> {
        let mut network = RoadNetwork::new();

        for road in &self.roads {
            network.add_road(road.name.clone(), road.length, road.speed_limit)?;
        }

        for intersection in &self.intersections {
            let light = intersection
                .light
                .as_ref()
                .map(|light| light.build(&intersection.source))
                .transpose()?;
            let destinations: Vec<&str> = intersection
                .destinations
                .iter()
                .map(String::as_str)
                .collect();
            network.add_intersection(
                &intersection.source,
                &destinations,
                light,
                intersection.policy,
            )?;
        }

        for vehicle in &self.vehicles {
            let context = format!("vehicle {}", VehicleId(vehicle.id));
            let road_id = network.resolve(&vehicle.road, &context)?;
            let mut built = Vehicle::new(VehicleId(vehicle.id), road_id, vehicle.position, vehicle.speed);
            if let Some(desired) = vehicle.desired_speed {
                built = built.with_desired_speed(desired);
            }
            network.place_vehicle(road_id, built)?;
        }

        Ok(network)
    }

    /// A small demo: a feeder road into a signalised junction that splits
    /// into two arterials, one of which loops back through a roundabout link.
    pub fn demo() -> Self {
        let road = |name: &str, length: f64, speed_limit: f64| RoadConfig {
            name: name.to_string(),
            length,
            speed_limit,
        };
        let vehicle = |id: u64, road: &str, position: f64, speed: f64| VehicleConfig {
            id,
            road: road.to_string(),
            position,
            speed,
            desired_speed: None,
        };

        Self {
            roads: vec![
                road("Avenue", 800.0, 14.0),
                road("North", 1200.0, 20.0),
                road("South", 600.0, 11.0),
                road("Ring", 400.0, 8.0),
                road("Motorway", 3000.0, 33.0),
            ],
            intersections: vec![
                IntersectionConfig {
                    source: "Avenue".to_string(),
                    destinations: vec!["North".to_string(), "South".to_string()],
                    light: Some(LightConfig::Cycle {
                        cycle: vec![
                            (LightPhase::Green, 30.0),
                            (LightPhase::Amber, 4.0),
                            (LightPhase::Red, 26.0),
                        ],
                    }),
                    policy: RoutingPolicy::RoundRobin,
                },
                IntersectionConfig {
                    source: "North".to_string(),
                    destinations: vec!["Motorway".to_string()],
                    light: None,
                    policy: RoutingPolicy::First,
                },
                IntersectionConfig {
                    source: "South".to_string(),
                    destinations: vec!["Ring".to_string()],
                    light: Some(LightConfig::Uniform { uniform: 15.0 }),
                    policy: RoutingPolicy::First,
                },
                IntersectionConfig {
                    source: "Ring".to_string(),
                    destinations: vec!["Avenue".to_string(), "Motorway".to_string()],
                    light: None,
                    policy: RoutingPolicy::RoundRobin,
                },
            ],
            vehicles: vec![
                vehicle(1, "Avenue", 0.0, 12.0),
                vehicle(2, "Avenue", 150.0, 10.0),
                vehicle(3, "Avenue", 400.0, 14.0),
                vehicle(4, "North", 300.0, 18.0),
                vehicle(5, "South", 100.0, 9.0),
                vehicle(6, "Ring", 50.0, 6.0),
                vehicle(7, "Motorway", 1000.0, 30.0),
            ],
            inflows: vec![InflowConfig {
                road: "Avenue".to_string(),
                rate: 0.1,
                speed: Some(10.0),
            }],
        }
    }
}
