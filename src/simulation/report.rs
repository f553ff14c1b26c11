//! Per-tick state snapshots for progress output
//!
//! A snapshot is a plain copy of what a reporter needs: the step, the
//! simulated time and, per road, its vehicles and lights. It is never fed
//! back into the simulation.

use std::fmt;

use super::traffic_light::LightState;
use super::types::VehicleClass;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub class: VehicleClass,
    /// Position rounded to the nearest unit
    pub position: i64,
    /// Speed rounded to one decimal
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSnapshot {
    pub position: f64,
    pub state: LightState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadSnapshot {
    pub name: String,
    pub length: f64,
    pub vehicles: Vec<VehicleSnapshot>,
    pub lights: Vec<LightSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSnapshot {
    pub step: u64,
    pub time: f64,
    pub roads: Vec<RoadSnapshot>,
}

impl VehicleSnapshot {
    pub fn new(class: VehicleClass, position: f64, speed: f64) -> Self {
        Self {
            class,
            position: position.round() as i64,
            speed: (speed * 10.0).round() / 10.0,
        }
    }
}

impl SimulationSnapshot {
    pub fn vehicle_count(&self) -> usize {
        self.roads.iter().map(|road| road.vehicles.len()).sum()
    }

    /// Draw every road as a strip of `width` cells.
    ///
    /// Vehicles use their class glyph, lights show as `G` or `R`, empty road
    /// as `-`. A vehicle drawn on the same cell as a light hides the light.
    pub fn render_map(&self, width: usize) -> String {
        let width = width.max(10);
        let name_width = self
            .roads
            .iter()
            .map(|road| road.name.chars().count())
            .max()
            .unwrap_or(0);

        let to_cell = |position: f64, length: f64| -> usize {
            let ratio = (position / length).clamp(0.0, 1.0);
            ((ratio * (width - 1) as f64).round() as usize).min(width - 1)
        };

        let mut out = String::new();
        for road in &self.roads {
            let mut cells = vec!['-'; width];

            for light in &road.lights {
                cells[to_cell(light.position, road.length)] = match light.state {
                    LightState::Green => 'G',
                    LightState::Red => 'R',
                };
            }

            for vehicle in &road.vehicles {
                cells[to_cell(vehicle.position as f64, road.length)] = vehicle.class.glyph();
            }

            let strip: String = cells.into_iter().collect();
            out.push_str(&format!("{:<name_width$} |{}|\n", road.name, strip));
        }
        out.push_str("Legend: C=car, B=bus, P=police car, A=ambulance, F=fire truck, G/R=light\n");
        out
    }
}

impl fmt::Display for SimulationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Step: {}", self.step)?;
        writeln!(f, "Time: {:.4}", self.time)?;
        writeln!(f)?;

        for road in self.roads.iter().filter(|road| !road.vehicles.is_empty()) {
            writeln!(f, "Road: {}", road.name)?;
            writeln!(f)?;

            for (index, vehicle) in road.vehicles.iter().enumerate() {
                writeln!(f, "Vehicle {}", index + 1)?;
                writeln!(f, "-> type: {}", vehicle.class)?;
                writeln!(f, "-> position: {}", vehicle.position)?;
                writeln!(f, "-> speed: {:.1}", vehicle.speed)?;
                writeln!(f)?;
            }

            for light in &road.lights {
                writeln!(f, "Traffic light at position {} is {}", light.position, light.state)?;
                writeln!(f)?;
            }
        }

        write!(f, "-----------------------------------")
    }
}
