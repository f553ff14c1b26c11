//! Traffic light logic for the traffic simulation

use anyhow::{ensure, Result};
use std::fmt;

use super::types::{LightId, RoadId};

/// Signal shown by a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Green,
    Red,
}

impl LightState {
    pub fn toggled(self) -> Self {
        match self {
            LightState::Green => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Green => f.write_str("green"),
            LightState::Red => f.write_str("red"),
        }
    }
}

/// A two-state cyclic traffic light bound to a road position
#[derive(Debug, Clone)]
pub struct SimTrafficLight {
    pub id: LightId,
    pub road: RoadId,
    pub position: f64,
    /// Time the light stays in one state before switching
    pub cycle: f64,
    pub state: LightState,
    /// Simulated time of the last switch
    pub last_switch: f64,
}

impl SimTrafficLight {
    pub fn new(id: LightId, road: RoadId, position: f64, cycle: f64) -> Result<Self> {
        ensure!(
            position.is_finite() && position >= 0.0,
            "Traffic light {:?}: position must be non-negative, got {}",
            id,
            position
        );
        ensure!(
            cycle.is_finite() && cycle > 0.0,
            "Traffic light {:?}: cycle must be positive, got {}",
            id,
            cycle
        );

        Ok(Self {
            id,
            road,
            position,
            cycle,
            state: LightState::Green,
            last_switch: 0.0,
        })
    }

    pub fn is_green(&self) -> bool {
        self.state == LightState::Green
    }

    pub fn is_red(&self) -> bool {
        self.state == LightState::Red
    }

    /// Switch state once a full cycle has elapsed since the last switch.
    /// Returns true when the light switched.
    pub fn update(&mut self, current_time: f64) -> Result<bool> {
        ensure!(
            current_time >= 0.0 && current_time >= self.last_switch,
            "Traffic light {:?}: time went backwards ({} < {})",
            self.id,
            current_time,
            self.last_switch
        );

        if current_time - self.last_switch >= self.cycle {
            self.state = self.state.toggled();
            self.last_switch = current_time;
            return Ok(true);
        }

        Ok(false)
    }
}
