//! Vehicle kinematics for the traffic simulation
//!
//! A vehicle owns its position, speed and acceleration along the road it is
//! on. Acceleration follows a closed-form car-following law, red lights ahead
//! override it with a braking profile, and buses dwell at bus stops.

use anyhow::{ensure, Result};

use super::bus_stop::SimBusStop;
use super::traffic_light::SimTrafficLight;
use super::types::{
    IntersectionId, RoadId, StopId, VehicleClass, VehicleId, BUS_STOP_PROXIMITY,
    LIGHT_BRAKING_DISTANCE, MAX_ACCELERATION, MAX_BRAKING, MIN_FOLLOWING_DISTANCE, MIN_GAP, TICK,
};

/// State of the vehicle directly ahead, copied out of the road so the
/// follower can be borrowed mutably
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadingVehicle {
    pub position: f64,
    pub speed: f64,
}

/// Outcome of checking a vehicle against a bus stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellStatus {
    /// Held at the stop, integration must be skipped this tick
    Waiting,
    /// Free to move
    NotWaiting,
}

/// Wait accumulated at one particular stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellState {
    pub stop: StopId,
    pub elapsed: f64,
    pub waiting: bool,
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    /// The road that currently owns this vehicle
    pub road: RoadId,
    pub position: f64,
    pub speed: f64,
    pub acceleration: f64,
    /// One wait accumulator per stop the vehicle is currently at
    pub dwell: Vec<DwellState>,
    /// Intersection that last moved this vehicle, cleared once the vehicle
    /// leaves that intersection's tolerance zone
    pub routed_by: Option<IntersectionId>,
}

impl SimVehicle {
    pub fn new(id: VehicleId, class: VehicleClass, road: RoadId, position: f64) -> Result<Self> {
        ensure!(
            position.is_finite() && position >= 0.0,
            "Vehicle {:?}: position must be non-negative, got {}",
            id,
            position
        );

        Ok(Self {
            id,
            class,
            road,
            position,
            speed: 0.0,
            acceleration: 0.0,
            dwell: Vec::new(),
            routed_by: None,
        })
    }

    pub fn max_speed(&self) -> f64 {
        self.class.max_speed()
    }

    pub fn is_dwelling(&self) -> bool {
        self.dwell.iter().any(|dwell| dwell.waiting)
    }

    /// Wait accumulated at `stop`, if the vehicle is at it
    pub fn dwell_at(&self, stop: StopId) -> Option<&DwellState> {
        self.dwell.iter().find(|dwell| dwell.stop == stop)
    }

    /// Compute acceleration from the vehicle ahead, or approach max speed on
    /// a free road
    pub fn compute_acceleration(&mut self, leader: Option<LeadingVehicle>) {
        let free_road = 1.0 - (self.speed / self.max_speed()).powi(4);

        self.acceleration = match leader {
            Some(lead) => {
                let gap = (lead.position - self.position - self.class.length()).max(MIN_GAP);
                let relative_speed = self.speed - lead.speed;
                let interaction = ((self.speed + relative_speed)
                    / (2.0 * (MAX_ACCELERATION * MAX_BRAKING).sqrt()))
                .max(0.0);
                let safe_gap = MIN_FOLLOWING_DISTANCE + interaction * gap;

                MAX_ACCELERATION * (free_road - (safe_gap / gap).powi(2))
            }
            None => MAX_ACCELERATION * free_road,
        };
    }

    /// Override acceleration with a braking profile for every red light
    /// ahead within braking distance. The strongest deceleration wins.
    pub fn apply_traffic_light_rules(&mut self, lights: &[SimTrafficLight]) {
        let braking = lights
            .iter()
            .filter(|light| light.is_red())
            .map(|light| light.position - self.position)
            .filter(|distance| *distance > 0.0 && *distance < LIGHT_BRAKING_DISTANCE)
            .map(|distance| {
                (-MAX_BRAKING).min(-(distance / LIGHT_BRAKING_DISTANCE).powi(2) * MAX_ACCELERATION)
            })
            .reduce(f64::min);

        if let Some(acceleration) = braking {
            self.acceleration = acceleration;
        }
    }

    /// Advance position and speed by `dt`.
    ///
    /// A vehicle that would end up with negative speed is brought to a halt
    /// at the point where it reaches zero speed instead.
    pub fn integrate(&mut self, dt: f64) -> Result<()> {
        ensure!(
            dt.is_finite() && dt > 0.0,
            "Vehicle {:?}: time step must be positive, got {}",
            self.id,
            dt
        );

        if self.speed + self.acceleration * dt < 0.0 {
            self.position -= self.speed * self.speed / (2.0 * self.acceleration);
            self.speed = 0.0;
        } else {
            self.speed = (self.speed + self.acceleration * dt).min(self.max_speed());
            self.position += self.speed * dt + 0.5 * self.acceleration * dt * dt;
        }

        // Never behind the road origin
        self.position = self.position.max(0.0);

        Ok(())
    }

    /// Check whether a bus has to wait at `stop` this tick.
    ///
    /// Each tick spent within proximity of the stop adds one tick to the
    /// accumulated wait until the stop's dwell duration is reached. Leaving
    /// the stop clears its accumulator. Stops close enough to overlap keep
    /// separate accumulators.
    pub fn evaluate_dwell(&mut self, stop: &SimBusStop) -> DwellStatus {
        if !self.class.stops_at_bus_stops() {
            return DwellStatus::NotWaiting;
        }

        if (self.position - stop.position).abs() >= BUS_STOP_PROXIMITY {
            self.dwell.retain(|dwell| dwell.stop != stop.id);
            return DwellStatus::NotWaiting;
        }

        let index = match self.dwell.iter().position(|dwell| dwell.stop == stop.id) {
            Some(index) => index,
            None => {
                self.dwell.push(DwellState {
                    stop: stop.id,
                    elapsed: 0.0,
                    waiting: false,
                });
                self.dwell.len() - 1
            }
        };
        let dwell = &mut self.dwell[index];

        if dwell.elapsed < stop.dwell_duration {
            dwell.elapsed += TICK;
            dwell.waiting = true;
            self.speed = 0.0;
            DwellStatus::Waiting
        } else {
            dwell.waiting = false;
            DwellStatus::NotWaiting
        }
    }
}
