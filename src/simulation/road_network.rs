//! Road network: owns every road and intersection
//!
//! Vehicles live inside the road that currently holds them and refer back to
//! it by id. Moving a vehicle between roads is an ownership transfer through
//! this type, so no road ever points at a vehicle it does not own.

use anyhow::{bail, ensure, Context, Result};
use log::debug;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

use super::intersection::{RoadBinding, SimIntersection};
use super::road::SimRoad;
use super::types::{IntersectionId, RoadId, VehicleId};
use super::vehicle::SimVehicle;

/// What happened on one road during a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadUpdateSummary {
    /// Vehicles handed to another road by an intersection
    pub switched: Vec<VehicleId>,
    /// Vehicles that drove off the end of the road
    pub exited: Vec<VehicleId>,
}

#[derive(Debug, Default)]
pub struct SimRoadNetwork {
    /// Roads keyed by id; ids increase with insertion so iteration follows
    /// creation order
    roads: BTreeMap<RoadId, SimRoad>,

    /// Maps road names to their ids
    road_names: HashMap<String, RoadId>,

    intersections: BTreeMap<IntersectionId, SimIntersection>,
}

impl SimRoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a road to the network. Road names must be unique.
    pub fn add_road(&mut self, road: SimRoad) -> Result<()> {
        if self.road_names.contains_key(&road.name) {
            bail!("Road '{}' already exists", road.name);
        }
        if self.roads.contains_key(&road.id) {
            bail!("Road id {:?} already exists", road.id);
        }

        self.road_names.insert(road.name.clone(), road.id);
        self.roads.insert(road.id, road);
        Ok(())
    }

    /// Gets a road by ID
    pub fn get_road(&self, road_id: RoadId) -> Option<&SimRoad> {
        self.roads.get(&road_id)
    }

    pub fn get_road_mut(&mut self, road_id: RoadId) -> Option<&mut SimRoad> {
        self.roads.get_mut(&road_id)
    }

    pub fn road_id(&self, name: &str) -> Option<RoadId> {
        self.road_names.get(name).copied()
    }

    pub fn road_by_name(&self, name: &str) -> Option<&SimRoad> {
        self.road_id(name).and_then(|id| self.roads.get(&id))
    }

    pub fn roads(&self) -> impl Iterator<Item = &SimRoad> {
        self.roads.values()
    }

    pub fn roads_mut(&mut self) -> impl Iterator<Item = &mut SimRoad> {
        self.roads.values_mut()
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// Adds an intersection after checking every binding against the roads
    /// it references
    pub fn add_intersection(&mut self, intersection: SimIntersection) -> Result<()> {
        if self.intersections.contains_key(&intersection.id) {
            bail!("Intersection {:?} already exists", intersection.id);
        }

        for binding in &intersection.bindings {
            let road = self.roads.get(&binding.road).with_context(|| {
                format!(
                    "Intersection {:?} references unknown road {:?}",
                    intersection.id, binding.road
                )
            })?;
            ensure!(
                binding.position <= road.length,
                "Intersection {:?}: position {} is beyond the end of road '{}' ({})",
                intersection.id,
                binding.position,
                road.name,
                road.length
            );
        }

        for road_id in intersection.entry_roads() {
            if let Some(road) = self.roads.get_mut(&road_id) {
                road.bind_intersection(intersection.id);
            }
        }

        self.intersections.insert(intersection.id, intersection);
        Ok(())
    }

    pub fn get_intersection(&self, intersection_id: IntersectionId) -> Option<&SimIntersection> {
        self.intersections.get(&intersection_id)
    }

    pub fn intersections(&self) -> impl Iterator<Item = &SimIntersection> {
        self.intersections.values()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    /// Total number of vehicles on all roads
    pub fn vehicle_count(&self) -> usize {
        self.roads.values().map(|road| road.vehicles().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.values().all(SimRoad::is_empty)
    }

    /// Find a vehicle on whichever road holds it
    pub fn find_vehicle(&self, vehicle_id: VehicleId) -> Option<&SimVehicle> {
        self.roads.values().find_map(|road| road.vehicle(vehicle_id))
    }

    /// Vehicle ids of every road, captured before a tick mutates them
    pub fn vehicle_snapshot(&self) -> Vec<(RoadId, Vec<VehicleId>)> {
        self.roads
            .values()
            .map(|road| (road.id, road.vehicle_ids()))
            .collect()
    }

    /// Move a vehicle from one road to the exit binding of another
    pub fn transfer_vehicle(&mut self, from: RoadId, vehicle_id: VehicleId, exit: RoadBinding) -> Result<()> {
        ensure!(
            self.roads.contains_key(&exit.road),
            "Cannot move vehicle {:?} to unknown road {:?}",
            vehicle_id,
            exit.road
        );

        let mut vehicle = self
            .roads
            .get_mut(&from)
            .with_context(|| format!("Road {:?} not found", from))?
            .remove_vehicle(vehicle_id)
            .with_context(|| format!("Vehicle {:?} is not on road {:?}", vehicle_id, from))?;

        vehicle.position = exit.position;
        // Stop waits and routing guards belong to the road being left
        vehicle.routed_by = None;
        vehicle.dwell.clear();

        let target = self
            .roads
            .get_mut(&exit.road)
            .with_context(|| format!("Road {:?} not found", exit.road))?;
        target.add_vehicle(vehicle)
    }

    /// Offer a vehicle to an intersection and perform the hand-off if the
    /// intersection routes it elsewhere. Returns true when the vehicle
    /// switched road.
    pub fn attempt_switch<R: Rng + ?Sized>(
        &mut self,
        intersection_id: IntersectionId,
        road_id: RoadId,
        vehicle_id: VehicleId,
        rng: &mut R,
    ) -> Result<bool> {
        let intersection = self
            .intersections
            .get(&intersection_id)
            .with_context(|| format!("Intersection {:?} not found", intersection_id))?;
        let road = self
            .roads
            .get_mut(&road_id)
            .with_context(|| format!("Road {:?} not found", road_id))?;
        let vehicle = road
            .vehicle_mut(vehicle_id)
            .with_context(|| format!("Vehicle {:?} is not on road {:?}", vehicle_id, road_id))?;

        if vehicle.routed_by == Some(intersection_id) {
            if intersection.is_near(vehicle) {
                return Ok(false);
            }
            vehicle.routed_by = None;
        }

        let Some(exit) = intersection.choose_exit(vehicle, rng) else {
            return Ok(false);
        };

        self.transfer_vehicle(road_id, vehicle_id, exit)?;

        if let Some(vehicle) = self
            .roads
            .get_mut(&exit.road)
            .and_then(|road| road.vehicle_mut(vehicle_id))
        {
            vehicle.routed_by = Some(intersection_id);
        }

        debug!(
            "Vehicle {:?} switched from road {:?} to road {:?} at {:.1} via intersection {:?}",
            vehicle_id, road_id, exit.road, exit.position, intersection_id
        );

        Ok(true)
    }

    /// Forget which intersection last routed a vehicle once it is no longer
    /// at one of that intersection's entries
    fn release_routing_guard(&mut self, road_id: RoadId, vehicle_id: VehicleId) {
        let Some(vehicle) = self
            .roads
            .get_mut(&road_id)
            .and_then(|road| road.vehicle_mut(vehicle_id))
        else {
            return;
        };
        let Some(routed_by) = vehicle.routed_by else {
            return;
        };
        let still_near = self
            .intersections
            .get(&routed_by)
            .is_some_and(|intersection| intersection.is_near(vehicle));
        if !still_near {
            vehicle.routed_by = None;
        }
    }

    /// Update one road using its current vehicles
    pub fn update_road<R: Rng + ?Sized>(&mut self, road_id: RoadId, dt: f64, rng: &mut R) -> Result<RoadUpdateSummary> {
        let vehicle_ids = self
            .roads
            .get(&road_id)
            .with_context(|| format!("Road {:?} not found", road_id))?
            .vehicle_ids();

        self.update_road_vehicles(road_id, &vehicle_ids, dt, rng)
    }

    /// Update the listed vehicles of one road: car-following, lights,
    /// bus-stop dwell, integration, intersection hand-off and removal at the
    /// road end. Vehicles that have left the road since the list was taken
    /// are skipped.
    pub fn update_road_vehicles<R: Rng + ?Sized>(
        &mut self,
        road_id: RoadId,
        vehicle_ids: &[VehicleId],
        dt: f64,
        rng: &mut R,
    ) -> Result<RoadUpdateSummary> {
        let mut summary = RoadUpdateSummary::default();

        for &vehicle_id in vehicle_ids {
            let road = self
                .roads
                .get_mut(&road_id)
                .with_context(|| format!("Road {:?} not found", road_id))?;

            if road.vehicle(vehicle_id).is_none() {
                continue;
            }

            road.advance_vehicle(vehicle_id, dt)?;
            self.release_routing_guard(road_id, vehicle_id);

            let road = self
                .roads
                .get(&road_id)
                .with_context(|| format!("Road {:?} not found", road_id))?;
            let intersection_ids = road.intersections().to_vec();
            let mut switched = false;
            for intersection_id in intersection_ids {
                if self.attempt_switch(intersection_id, road_id, vehicle_id, rng)? {
                    switched = true;
                    break;
                }
            }

            if switched {
                summary.switched.push(vehicle_id);
                continue;
            }

            let road = self
                .roads
                .get_mut(&road_id)
                .with_context(|| format!("Road {:?} not found", road_id))?;
            if road.has_reached_end(vehicle_id) {
                road.remove_vehicle(vehicle_id);
                debug!("Vehicle {:?} left road '{}'", vehicle_id, road.name);
                summary.exited.push(vehicle_id);
            }
        }

        Ok(summary)
    }
}
