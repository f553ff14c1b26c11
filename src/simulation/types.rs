//! Core types for the traffic simulation
//!
//! Typed ids, the closed set of vehicle classes and the fixed constants of
//! the physical model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for road IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadId(pub SimId);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

/// A wrapper type for traffic light IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub SimId);

/// A wrapper type for bus stop IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub SimId);

/// A wrapper type for intersection IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntersectionId(pub SimId);

/// A wrapper type for vehicle generator IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratorId(pub SimId);

/// Hands out ids from a single counter shared by every entity kind
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> SimId {
        let id = SimId(self.next);
        self.next += 1;
        id
    }
}

/// Class of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    #[serde(alias = "auto")]
    Car,
    Bus,
    #[serde(alias = "politiecombi")]
    PoliceCar,
    #[serde(alias = "ziekenwagen")]
    Ambulance,
    #[serde(alias = "brandweerwagen")]
    FireTruck,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 5] = [
        VehicleClass::Car,
        VehicleClass::Bus,
        VehicleClass::PoliceCar,
        VehicleClass::Ambulance,
        VehicleClass::FireTruck,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bus => "bus",
            VehicleClass::PoliceCar => "police car",
            VehicleClass::Ambulance => "ambulance",
            VehicleClass::FireTruck => "fire truck",
        }
    }

    /// Single character used by the road map
    pub fn glyph(self) -> char {
        match self {
            VehicleClass::Car => 'C',
            VehicleClass::Bus => 'B',
            VehicleClass::PoliceCar => 'P',
            VehicleClass::Ambulance => 'A',
            VehicleClass::FireTruck => 'F',
        }
    }

    /// Bumper-to-bumper length in world units
    pub fn length(self) -> f64 {
        VEHICLE_LENGTH
    }

    pub fn max_speed(self) -> f64 {
        MAX_SPEED
    }

    /// Only buses dwell at bus stops
    pub fn stops_at_bus_stops(self) -> bool {
        matches!(self, VehicleClass::Bus)
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed simulation tick in seconds (about 60 Hz)
pub const TICK: f64 = 0.0166;

/// Length of a vehicle in world units
pub const VEHICLE_LENGTH: f64 = 4.0;

/// Maximum speed (m/s)
pub const MAX_SPEED: f64 = 16.6;

/// Maximum acceleration (m/s^2)
pub const MAX_ACCELERATION: f64 = 1.44;

/// Maximum braking deceleration (m/s^2)
pub const MAX_BRAKING: f64 = 4.61;

/// Minimum following distance
pub const MIN_FOLLOWING_DISTANCE: f64 = 4.0;

/// Distance ahead of a red light at which braking starts
pub const LIGHT_BRAKING_DISTANCE: f64 = 15.0;

/// Floor applied to the gap before it is used as a divisor
pub const MIN_GAP: f64 = 0.01;

/// A bus closer than this to a stop is considered to be at the stop
pub const BUS_STOP_PROXIMITY: f64 = 0.5;

/// A vehicle within this distance of an intersection binding is near it
pub const INTERSECTION_TOLERANCE: f64 = 1.0;

/// Chance that a vehicle near an intersection entry switches road
pub const SWITCH_PROBABILITY: f64 = 0.3;

/// Roads shorter than this are stretched to this length
pub const MIN_ROAD_LENGTH: f64 = 100.0;

/// Two lights on the same road must be at least this far apart
pub const MIN_LIGHT_SEPARATION: f64 = 50.0;

/// Length of the road origin that must be empty before a generator spawns
pub const SPAWN_ZONE_LENGTH: f64 = 2.0 * VEHICLE_LENGTH;
