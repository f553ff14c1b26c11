//! Road logic for the traffic simulation
//!
//! A road owns the vehicles currently driving on it together with the
//! traffic lights and bus stops placed along it. Hand-off to other roads
//! goes through the road network, which owns all roads.

use anyhow::{bail, ensure, Context, Result};
use ordered_float::OrderedFloat;

use super::bus_stop::SimBusStop;
use super::traffic_light::SimTrafficLight;
use super::types::{
    IntersectionId, RoadId, VehicleId, MIN_LIGHT_SEPARATION, MIN_ROAD_LENGTH, SPAWN_ZONE_LENGTH,
};
use super::vehicle::{DwellStatus, LeadingVehicle, SimVehicle};

/// Result of advancing a single vehicle by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    /// Vehicle integrated its motion
    Moved,
    /// Vehicle is held at a bus stop and did not move
    Dwelling,
}

/// A named one-dimensional road
#[derive(Debug, Clone)]
pub struct SimRoad {
    pub id: RoadId,
    pub name: String,
    pub length: f64,
    vehicles: Vec<SimVehicle>,
    lights: Vec<SimTrafficLight>,
    stops: Vec<SimBusStop>,
    intersections: Vec<IntersectionId>,
}

impl SimRoad {
    /// Create a road. Lengths below the minimum are stretched to it.
    pub fn new(id: RoadId, name: impl Into<String>, length: f64) -> Result<Self> {
        let name = name.into();
        ensure!(!name.trim().is_empty(), "Road {:?}: name must not be empty", id);
        ensure!(
            length.is_finite() && length > 0.0,
            "Road '{}': length must be positive, got {}",
            name,
            length
        );

        Ok(Self {
            id,
            name,
            length: length.max(MIN_ROAD_LENGTH),
            vehicles: Vec::new(),
            lights: Vec::new(),
            stops: Vec::new(),
            intersections: Vec::new(),
        })
    }

    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    pub fn lights(&self) -> &[SimTrafficLight] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [SimTrafficLight] {
        &mut self.lights
    }

    pub fn stops(&self) -> &[SimBusStop] {
        &self.stops
    }

    pub fn intersections(&self) -> &[IntersectionId] {
        &self.intersections
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    pub fn vehicle_mut(&mut self, vehicle_id: VehicleId) -> Option<&mut SimVehicle> {
        self.vehicles.iter_mut().find(|v| v.id == vehicle_id)
    }

    /// Ids of the vehicles on this road, in iteration order
    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter().map(|v| v.id).collect()
    }

    /// Put a vehicle on this road
    pub fn add_vehicle(&mut self, mut vehicle: SimVehicle) -> Result<()> {
        ensure!(
            vehicle.position >= 0.0 && vehicle.position <= self.length,
            "Road '{}': vehicle {:?} position {} is outside 0..={}",
            self.name,
            vehicle.id,
            vehicle.position,
            self.length
        );
        if self.vehicle(vehicle.id).is_some() {
            bail!("Road '{}': vehicle {:?} is already on this road", self.name, vehicle.id);
        }

        vehicle.road = self.id;
        self.vehicles.push(vehicle);
        Ok(())
    }

    /// Take a vehicle off this road, handing ownership to the caller
    pub fn remove_vehicle(&mut self, vehicle_id: VehicleId) -> Option<SimVehicle> {
        let index = self.vehicles.iter().position(|v| v.id == vehicle_id)?;
        Some(self.vehicles.remove(index))
    }

    pub fn add_traffic_light(&mut self, light: SimTrafficLight) -> Result<()> {
        ensure!(
            light.road == self.id,
            "Road '{}': traffic light {:?} is bound to another road",
            self.name,
            light.id
        );
        ensure!(
            light.position <= self.length,
            "Road '{}': traffic light at {} is beyond the road end {}",
            self.name,
            light.position,
            self.length
        );
        if let Some(other) = self
            .lights
            .iter()
            .find(|other| (other.position - light.position).abs() < MIN_LIGHT_SEPARATION)
        {
            bail!(
                "Road '{}': traffic light at {} is closer than {} to the light at {}",
                self.name,
                light.position,
                MIN_LIGHT_SEPARATION,
                other.position
            );
        }

        self.lights.push(light);
        Ok(())
    }

    pub fn add_bus_stop(&mut self, stop: SimBusStop) -> Result<()> {
        ensure!(
            stop.road == self.id,
            "Road '{}': bus stop {:?} is bound to another road",
            self.name,
            stop.id
        );
        ensure!(
            stop.position <= self.length,
            "Road '{}': bus stop at {} is beyond the road end {}",
            self.name,
            stop.position,
            self.length
        );

        self.stops.push(stop);
        Ok(())
    }

    pub fn bind_intersection(&mut self, intersection_id: IntersectionId) {
        if !self.intersections.contains(&intersection_id) {
            self.intersections.push(intersection_id);
        }
    }

    /// Find the nearest vehicle strictly ahead of the given one.
    /// Equidistant vehicles resolve to the one added to the road first.
    pub fn find_leading_vehicle(&self, vehicle_id: VehicleId) -> Option<&SimVehicle> {
        let position = self.vehicle(vehicle_id)?.position;

        self.vehicles
            .iter()
            .filter(|other| other.id != vehicle_id && other.position > position)
            .min_by_key(|other| OrderedFloat(other.position - position))
    }

    /// Check that no vehicle occupies the spawn zone at the road origin
    pub fn is_origin_clear(&self) -> bool {
        self.vehicles
            .iter()
            .all(|vehicle| vehicle.position >= SPAWN_ZONE_LENGTH)
    }

    /// Run car-following, light compliance, bus-stop dwell and integration
    /// for one vehicle
    pub fn advance_vehicle(&mut self, vehicle_id: VehicleId, dt: f64) -> Result<VehicleUpdateResult> {
        let leader = self
            .find_leading_vehicle(vehicle_id)
            .map(|lead| LeadingVehicle {
                position: lead.position,
                speed: lead.speed,
            });

        let vehicle = self
            .vehicles
            .iter_mut()
            .find(|v| v.id == vehicle_id)
            .with_context(|| format!("Vehicle {:?} not found on road '{}'", vehicle_id, self.name))?;

        vehicle.compute_acceleration(leader);
        vehicle.apply_traffic_light_rules(&self.lights);

        let mut status = DwellStatus::NotWaiting;
        for stop in &self.stops {
            if vehicle.evaluate_dwell(stop) == DwellStatus::Waiting {
                status = DwellStatus::Waiting;
            }
        }

        if status == DwellStatus::Waiting {
            return Ok(VehicleUpdateResult::Dwelling);
        }

        vehicle.integrate(dt)?;
        Ok(VehicleUpdateResult::Moved)
    }

    /// Check whether a vehicle has driven past the end of the road
    pub fn has_reached_end(&self, vehicle_id: VehicleId) -> bool {
        self.vehicle(vehicle_id)
            .is_some_and(|vehicle| vehicle.position >= self.length)
    }
}
