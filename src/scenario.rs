//! Scenario loading
//!
//! A scenario is a JSON document describing the roads and everything placed
//! on them. It is validated as a whole while the simulation is built: any
//! bad entry rejects the scenario before a single step runs.
//!
//! ```json
//! {
//!   "roads": [{ "name": "Main", "length": 250 }],
//!   "vehicles": [{ "road": "Main", "position": 10, "type": "bus" }],
//!   "traffic_lights": [{ "road": "Main", "position": 120, "cycle": 20 }],
//!   "bus_stops": [{ "road": "Main", "position": 60, "dwell": 5 }],
//!   "generators": [{ "road": "Main", "interval": 8, "type": "car" }]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::simulation::{RoadBinding, RoadId, RoutingPolicy, Simulation, VehicleClass, SWITCH_PROBABILITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub roads: Vec<RoadSpec>,
    #[serde(default)]
    pub vehicles: Vec<VehicleSpec>,
    #[serde(default)]
    pub traffic_lights: Vec<TrafficLightSpec>,
    #[serde(default)]
    pub bus_stops: Vec<BusStopSpec>,
    #[serde(default)]
    pub intersections: Vec<IntersectionSpec>,
    #[serde(default)]
    pub generators: Vec<GeneratorSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadSpec {
    pub name: String,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleSpec {
    pub road: String,
    pub position: f64,
    #[serde(rename = "type", default = "default_class")]
    pub class: VehicleClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLightSpec {
    pub road: String,
    pub position: f64,
    pub cycle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusStopSpec {
    pub road: String,
    pub position: f64,
    /// Seconds a bus waits at the stop
    #[serde(alias = "wait_time")]
    pub dwell: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingSpec {
    pub road: String,
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicySpec {
    FixedProbability {
        #[serde(default = "default_switch_probability")]
        probability: f64,
    },
    UniformExit,
}

impl Default for PolicySpec {
    fn default() -> Self {
        PolicySpec::FixedProbability {
            probability: SWITCH_PROBABILITY,
        }
    }
}

impl From<PolicySpec> for RoutingPolicy {
    fn from(spec: PolicySpec) -> Self {
        match spec {
            PolicySpec::FixedProbability { probability } => RoutingPolicy::FixedProbability(probability),
            PolicySpec::UniformExit => RoutingPolicy::UniformExit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntersectionSpec {
    pub bindings: Vec<BindingSpec>,
    #[serde(default)]
    pub policy: PolicySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSpec {
    pub road: String,
    /// Seconds between spawns
    #[serde(alias = "frequency")]
    pub interval: f64,
    #[serde(rename = "type", default = "default_class")]
    pub class: VehicleClass,
}

fn default_class() -> VehicleClass {
    VehicleClass::Car
}

fn default_switch_probability() -> f64 {
    SWITCH_PROBABILITY
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Scenario is not valid JSON or is missing fields")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Build a simulation from this scenario. Any invalid entry fails the
    /// whole build, so a partially loaded simulation is never returned.
    pub fn build(&self, seed: Option<u64>) -> Result<Simulation> {
        let mut sim = match seed {
            Some(seed) => Simulation::new_with_seed(seed),
            None => Simulation::new(),
        };

        for (index, road) in self.roads.iter().enumerate() {
            sim.add_road(&road.name, road.length)
                .with_context(|| format!("Invalid road #{} '{}'", index, road.name))?;
        }

        for (index, vehicle) in self.vehicles.iter().enumerate() {
            let road = resolve_road(&sim, &vehicle.road)
                .with_context(|| format!("Invalid vehicle #{}", index))?;
            sim.add_vehicle(road, vehicle.class, vehicle.position)
                .with_context(|| format!("Invalid vehicle #{}", index))?;
        }

        for (index, light) in self.traffic_lights.iter().enumerate() {
            let road = resolve_road(&sim, &light.road)
                .with_context(|| format!("Invalid traffic light #{}", index))?;
            sim.add_traffic_light(road, light.position, light.cycle)
                .with_context(|| format!("Invalid traffic light #{}", index))?;
        }

        for (index, stop) in self.bus_stops.iter().enumerate() {
            let road = resolve_road(&sim, &stop.road)
                .with_context(|| format!("Invalid bus stop #{}", index))?;
            sim.add_bus_stop(road, stop.position, stop.dwell)
                .with_context(|| format!("Invalid bus stop #{}", index))?;
        }

        for (index, intersection) in self.intersections.iter().enumerate() {
            let bindings = intersection
                .bindings
                .iter()
                .map(|binding| -> Result<RoadBinding> {
                    Ok(RoadBinding {
                        road: resolve_road(&sim, &binding.road)?,
                        position: binding.position,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Invalid intersection #{}", index))?;
            sim.add_intersection(bindings, intersection.policy.into())
                .with_context(|| format!("Invalid intersection #{}", index))?;
        }

        for (index, generator) in self.generators.iter().enumerate() {
            let road = resolve_road(&sim, &generator.road)
                .with_context(|| format!("Invalid vehicle generator #{}", index))?;
            sim.add_generator(road, generator.interval, generator.class)
                .with_context(|| format!("Invalid vehicle generator #{}", index))?;
        }

        Ok(sim)
    }
}

fn resolve_road(sim: &Simulation, name: &str) -> Result<RoadId> {
    sim.road_network
        .road_id(name)
        .with_context(|| format!("Unknown road '{}'", name))
}
