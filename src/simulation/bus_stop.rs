//! Bus stops: where buses dwell and for how long

use anyhow::{ensure, Result};

use super::types::{RoadId, StopId};

#[derive(Debug, Clone, PartialEq)]
pub struct SimBusStop {
    pub id: StopId,
    pub road: RoadId,
    pub position: f64,
    /// Seconds a bus waits here
    pub dwell_duration: f64,
}

impl SimBusStop {
    pub fn new(id: StopId, road: RoadId, position: f64, dwell_duration: f64) -> Result<Self> {
        ensure!(
            position.is_finite() && position >= 0.0,
            "Bus stop {:?}: position must be non-negative, got {}",
            id,
            position
        );
        ensure!(
            dwell_duration.is_finite() && dwell_duration >= 0.0,
            "Bus stop {:?}: dwell duration must be non-negative, got {}",
            id,
            dwell_duration
        );

        Ok(Self {
            id,
            road,
            position,
            dwell_duration,
        })
    }
}
