//! Main simulation world that ties everything together
//!
//! This is the entry point for running the traffic simulation. One step
//! updates every road (and the vehicles on it), then every traffic light,
//! then every vehicle generator, and finally advances the clock by one tick.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::bus_stop::SimBusStop;
use super::generator::SimVehicleGenerator;
use super::intersection::{RoadBinding, RoutingPolicy, SimIntersection};
use super::report::{LightSnapshot, RoadSnapshot, SimulationSnapshot, VehicleSnapshot};
use super::road::SimRoad;
use super::road_network::SimRoadNetwork;
use super::traffic_light::SimTrafficLight;
use super::types::{
    GeneratorId, IdAllocator, IntersectionId, LightId, RoadId, StopId, VehicleClass, VehicleId,
    TICK,
};
use super::vehicle::SimVehicle;

/// Counters accumulated over the lifetime of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub vehicles_spawned: u64,
    pub vehicles_exited: u64,
    pub intersection_switches: u64,
    pub light_switches: u64,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AllRoadsEmpty,
    StepBudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Steps executed by this run
    pub steps: u64,
    pub reason: StopReason,
}

/// The main simulation world
pub struct Simulation {
    /// All roads, with the vehicles, lights and stops on them, and all
    /// intersections
    pub road_network: SimRoadNetwork,

    generators: Vec<SimVehicleGenerator>,

    ids: IdAllocator,

    /// Simulated time
    pub time: f64,

    /// Number of completed steps
    pub step_count: u64,

    /// Routing RNG, owned here so runs can be reproduced from a seed
    rng: StdRng,

    pub stats: SimulationStats,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    fn new_internal(rng: StdRng) -> Self {
        Self {
            road_network: SimRoadNetwork::new(),
            generators: Vec::new(),
            ids: IdAllocator::new(),
            time: 0.0,
            step_count: 0,
            rng,
            stats: SimulationStats::default(),
        }
    }

    pub fn new() -> Self {
        Self::new_internal(StdRng::from_os_rng())
    }

    /// Create a new Simulation with a seeded RNG for reproducible runs
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(StdRng::seed_from_u64(seed))
    }

    /// Add a road. Lengths below the minimum are stretched to it.
    pub fn add_road(&mut self, name: &str, length: f64) -> Result<RoadId> {
        let id = RoadId(self.ids.next_id());
        let road = SimRoad::new(id, name, length)?;
        self.road_network.add_road(road)?;
        Ok(id)
    }

    fn road_mut(&mut self, road_id: RoadId) -> Result<&mut SimRoad> {
        self.road_network
            .get_road_mut(road_id)
            .with_context(|| format!("Road {:?} not found", road_id))
    }

    /// Place a stationary vehicle on a road
    pub fn add_vehicle(&mut self, road_id: RoadId, class: VehicleClass, position: f64) -> Result<VehicleId> {
        let id = VehicleId(self.ids.next_id());
        let vehicle = SimVehicle::new(id, class, road_id, position)?;
        self.road_mut(road_id)?.add_vehicle(vehicle)?;
        Ok(id)
    }

    pub fn add_traffic_light(&mut self, road_id: RoadId, position: f64, cycle: f64) -> Result<LightId> {
        let id = LightId(self.ids.next_id());
        let light = SimTrafficLight::new(id, road_id, position, cycle)?;
        self.road_mut(road_id)?.add_traffic_light(light)?;
        Ok(id)
    }

    pub fn add_bus_stop(&mut self, road_id: RoadId, position: f64, dwell_duration: f64) -> Result<StopId> {
        let id = StopId(self.ids.next_id());
        let stop = SimBusStop::new(id, road_id, position, dwell_duration)?;
        self.road_mut(road_id)?.add_bus_stop(stop)?;
        Ok(id)
    }

    pub fn add_intersection(
        &mut self,
        bindings: Vec<RoadBinding>,
        policy: RoutingPolicy,
    ) -> Result<IntersectionId> {
        let id = IntersectionId(self.ids.next_id());
        let intersection = SimIntersection::new(id, bindings, policy)?;
        self.road_network.add_intersection(intersection)?;
        Ok(id)
    }

    pub fn add_generator(&mut self, road_id: RoadId, interval: f64, class: VehicleClass) -> Result<GeneratorId> {
        self.road_network
            .get_road(road_id)
            .with_context(|| format!("Vehicle generator references unknown road {:?}", road_id))?;

        let id = GeneratorId(self.ids.next_id());
        self.generators
            .push(SimVehicleGenerator::new(id, road_id, interval, class)?);
        Ok(id)
    }

    pub fn generators(&self) -> &[SimVehicleGenerator] {
        &self.generators
    }

    /// Find a vehicle on any road
    pub fn vehicle(&self, vehicle_id: VehicleId) -> Option<&SimVehicle> {
        self.road_network.find_vehicle(vehicle_id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.road_network.vehicle_count()
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self) -> Result<()> {
        // Each vehicle is visited at most once per tick, even if an
        // intersection moves it onto a road that is updated later.
        for (road_id, vehicle_ids) in self.road_network.vehicle_snapshot() {
            let summary =
                self.road_network
                    .update_road_vehicles(road_id, &vehicle_ids, TICK, &mut self.rng)?;
            self.stats.intersection_switches += summary.switched.len() as u64;
            self.stats.vehicles_exited += summary.exited.len() as u64;
        }

        for road in self.road_network.roads_mut() {
            let road_name = road.name.clone();
            for light in road.lights_mut() {
                if light.update(self.time)? {
                    self.stats.light_switches += 1;
                    debug!(
                        "Traffic light at {} on road '{}' turned {}",
                        light.position, road_name, light.state
                    );
                }
            }
        }

        for generator in &mut self.generators {
            let road = self
                .road_network
                .get_road_mut(generator.road)
                .with_context(|| format!("Road {:?} not found", generator.road))?;
            if let Some(vehicle_id) = generator.update(self.time, road, &mut self.ids)? {
                self.stats.vehicles_spawned += 1;
                debug!(
                    "Generator {:?} spawned {} {:?} on road '{}'",
                    generator.id, generator.class, vehicle_id, road.name
                );
            }
        }

        self.time += TICK;
        self.step_count += 1;

        Ok(())
    }

    /// Step until every road is empty or `max_steps` steps have run.
    /// `observer` sees the simulation after every step.
    pub fn run<F>(&mut self, max_steps: Option<u64>, mut observer: F) -> Result<RunOutcome>
    where
        F: FnMut(&Simulation),
    {
        info!(
            "Starting simulation: {} roads, {} intersections, {} generators, {} vehicles",
            self.road_network.road_count(),
            self.road_network.intersection_count(),
            self.generators.len(),
            self.vehicle_count()
        );

        let mut steps = 0;
        loop {
            if max_steps.is_some_and(|max| steps >= max) {
                if !self.road_network.is_empty() {
                    warn!(
                        "Step budget of {} exhausted with {} vehicles still on the roads",
                        steps,
                        self.vehicle_count()
                    );
                }
                return Ok(RunOutcome {
                    steps,
                    reason: StopReason::StepBudgetExhausted,
                });
            }

            self.step()
                .with_context(|| format!("Simulation step {} failed", self.step_count))?;
            steps += 1;
            observer(self);

            if self.road_network.is_empty() {
                info!("Simulation ended, no vehicles on roads");
                return Ok(RunOutcome {
                    steps,
                    reason: StopReason::AllRoadsEmpty,
                });
            }
        }
    }

    /// Copy out the state a reporter needs
    pub fn snapshot(&self) -> SimulationSnapshot {
        let roads = self
            .road_network
            .roads()
            .map(|road| RoadSnapshot {
                name: road.name.clone(),
                length: road.length,
                vehicles: road
                    .vehicles()
                    .iter()
                    .map(|vehicle| VehicleSnapshot::new(vehicle.class, vehicle.position, vehicle.speed))
                    .collect(),
                lights: road
                    .lights()
                    .iter()
                    .map(|light| LightSnapshot {
                        position: light.position,
                        state: light.state,
                    })
                    .collect(),
            })
            .collect();

        SimulationSnapshot {
            step: self.step_count,
            time: self.time,
            roads,
        }
    }

    /// Log the final statistics block
    pub fn log_summary(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Steps: {}", self.step_count);
        info!("Simulated time: {:.2}s", self.time);
        info!("Vehicles spawned: {}", self.stats.vehicles_spawned);
        info!("Vehicles exited: {}", self.stats.vehicles_exited);
        info!("Intersection switches: {}", self.stats.intersection_switches);
        info!("Light switches: {}", self.stats.light_switches);
        info!("Vehicles remaining: {}", self.vehicle_count());
    }

    /// Create a small demo world with every kind of entity on it
    pub fn create_demo_world() -> Result<Self> {
        Self::build_demo_world(Simulation::new())
    }

    /// Create the demo world with a seeded RNG for reproducible runs
    pub fn create_demo_world_with_seed(seed: u64) -> Result<Self> {
        Self::build_demo_world(Simulation::new_with_seed(seed))
    }

    fn build_demo_world(mut sim: Simulation) -> Result<Self> {
        let main = sim.add_road("Main Street", 400.0)?;
        let side = sim.add_road("Side Street", 200.0)?;
        let ring = sim.add_road("Ring Road", 250.0)?;

        sim.add_vehicle(main, VehicleClass::Car, 40.0)?;
        sim.add_vehicle(main, VehicleClass::Bus, 20.0)?;
        sim.add_vehicle(main, VehicleClass::Car, 0.0)?;
        sim.add_vehicle(side, VehicleClass::Ambulance, 10.0)?;
        sim.add_vehicle(ring, VehicleClass::FireTruck, 0.0)?;

        sim.add_traffic_light(main, 150.0, 12.0)?;
        sim.add_traffic_light(main, 320.0, 18.0)?;
        sim.add_traffic_light(side, 120.0, 9.0)?;

        sim.add_bus_stop(main, 90.0, 3.0)?;

        sim.add_intersection(
            vec![
                RoadBinding {
                    road: main,
                    position: 250.0,
                },
                RoadBinding {
                    road: side,
                    position: 0.0,
                },
            ],
            RoutingPolicy::default(),
        )?;
        sim.add_intersection(
            vec![
                RoadBinding {
                    road: side,
                    position: 160.0,
                },
                RoadBinding {
                    road: ring,
                    position: 50.0,
                },
                RoadBinding {
                    road: main,
                    position: 350.0,
                },
            ],
            RoutingPolicy::UniformExit,
        )?;

        sim.add_generator(main, 6.0, VehicleClass::Car)?;
        sim.add_generator(ring, 15.0, VehicleClass::PoliceCar)?;

        Ok(sim)
    }
}
