//! Standalone traffic microsimulation
//!
//! Vehicles drive along named one-dimensional roads under a car-following
//! law, obey cyclic traffic lights, dwell at bus stops (buses only) and may
//! be routed onto other roads at intersections.

mod bus_stop;
mod generator;
mod intersection;
mod report;
mod road;
mod road_network;
mod traffic_light;
mod types;
mod vehicle;
mod world;

pub use bus_stop::SimBusStop;
pub use generator::SimVehicleGenerator;
pub use intersection::{RoadBinding, RoutingPolicy, SimIntersection};
pub use report::{LightSnapshot, RoadSnapshot, SimulationSnapshot, VehicleSnapshot};
pub use road::{SimRoad, VehicleUpdateResult};
pub use road_network::{RoadUpdateSummary, SimRoadNetwork};
pub use traffic_light::{LightState, SimTrafficLight};
pub use types::{
    GeneratorId, IdAllocator, IntersectionId, LightId, RoadId, SimId, StopId, VehicleClass,
    VehicleId, BUS_STOP_PROXIMITY, INTERSECTION_TOLERANCE, LIGHT_BRAKING_DISTANCE,
    MAX_ACCELERATION, MAX_BRAKING, MAX_SPEED, MIN_FOLLOWING_DISTANCE, MIN_GAP,
    MIN_LIGHT_SEPARATION, MIN_ROAD_LENGTH, SPAWN_ZONE_LENGTH, SWITCH_PROBABILITY, TICK,
    VEHICLE_LENGTH,
};
pub use vehicle::{DwellState, DwellStatus, LeadingVehicle, SimVehicle};
pub use world::{RunOutcome, Simulation, SimulationStats, StopReason};
