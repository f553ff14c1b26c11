//! Vehicle generator logic for the traffic simulation
//!
//! A generator feeds new vehicles into the origin of its road at a fixed
//! interval, as long as the origin is clear.

use anyhow::{ensure, Result};

use super::road::SimRoad;
use super::types::{GeneratorId, IdAllocator, RoadId, VehicleClass, VehicleId};
use super::vehicle::SimVehicle;

#[derive(Debug, Clone)]
pub struct SimVehicleGenerator {
    pub id: GeneratorId,
    pub road: RoadId,
    /// Minimum simulated time between two spawns
    pub interval: f64,
    pub class: VehicleClass,
    /// Simulated time of the last successful spawn
    pub last_generated: f64,
}

impl SimVehicleGenerator {
    pub fn new(id: GeneratorId, road: RoadId, interval: f64, class: VehicleClass) -> Result<Self> {
        ensure!(
            interval.is_finite() && interval > 0.0,
            "Vehicle generator {:?}: spawn interval must be positive, got {}",
            id,
            interval
        );

        Ok(Self {
            id,
            road,
            interval,
            class,
            last_generated: 0.0,
        })
    }

    /// Check whether enough time has passed since the last spawn
    pub fn is_due(&self, current_time: f64) -> bool {
        current_time - self.last_generated >= self.interval
    }

    /// Spawn a vehicle at the origin of `road` when due and the spawn zone is
    /// clear. A blocked spawn is retried on every later call.
    pub fn update(
        &mut self,
        current_time: f64,
        road: &mut SimRoad,
        ids: &mut IdAllocator,
    ) -> Result<Option<VehicleId>> {
        ensure!(
            current_time >= self.last_generated,
            "Vehicle generator {:?}: time went backwards ({} < {})",
            self.id,
            current_time,
            self.last_generated
        );
        ensure!(
            road.id == self.road,
            "Vehicle generator {:?}: asked to spawn on road '{}' it is not bound to",
            self.id,
            road.name
        );

        if !self.is_due(current_time) || !road.is_origin_clear() {
            return Ok(None);
        }

        let vehicle_id = VehicleId(ids.next_id());
        let vehicle = SimVehicle::new(vehicle_id, self.class, self.road, 0.0)?;
        road.add_vehicle(vehicle)?;
        self.last_generated = current_time;

        Ok(Some(vehicle_id))
    }
}
