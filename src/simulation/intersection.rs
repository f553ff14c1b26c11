//! Intersection logic for the traffic simulation
//!
//! An intersection binds positions on two or more roads. A vehicle passing
//! an entry binding may be routed onto another road at the bound exit. The
//! intersection only makes the routing decision; moving the vehicle between
//! roads is done by the road network.

use anyhow::{ensure, Result};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::types::{IntersectionId, RoadId, INTERSECTION_TOLERANCE, SWITCH_PROBABILITY};
use super::vehicle::SimVehicle;

/// A position on a road that an intersection is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadBinding {
    pub road: RoadId,
    pub position: f64,
}

/// How an intersection picks an exit for a vehicle near one of its entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoutingPolicy {
    /// Exactly two bindings: the first is the entry and the second the exit.
    /// A vehicle near the entry switches with the given probability each
    /// time it is offered.
    FixedProbability(f64),
    /// Every binding is an entry. A vehicle near one of them always switches,
    /// to a binding on another road chosen uniformly.
    UniformExit,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        RoutingPolicy::FixedProbability(SWITCH_PROBABILITY)
    }
}

/// An intersection in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimIntersection {
    pub id: IntersectionId,
    pub bindings: Vec<RoadBinding>,
    pub policy: RoutingPolicy,
}

impl SimIntersection {
    /// Create an intersection. Road existence and road lengths are checked by
    /// the road network when the intersection is added to it.
    pub fn new(id: IntersectionId, bindings: Vec<RoadBinding>, policy: RoutingPolicy) -> Result<Self> {
        ensure!(
            bindings.len() >= 2,
            "Intersection {:?}: needs at least two bindings, got {}",
            id,
            bindings.len()
        );
        for binding in &bindings {
            ensure!(
                binding.position.is_finite() && binding.position >= 0.0,
                "Intersection {:?}: binding position must be non-negative, got {}",
                id,
                binding.position
            );
        }

        match policy {
            RoutingPolicy::FixedProbability(probability) => {
                ensure!(
                    bindings.len() == 2,
                    "Intersection {:?}: a fixed-probability intersection takes exactly one entry and one exit, got {} bindings",
                    id,
                    bindings.len()
                );
                ensure!(
                    (0.0..=1.0).contains(&probability),
                    "Intersection {:?}: switch probability must be within 0..=1, got {}",
                    id,
                    probability
                );
                ensure!(
                    bindings[0].road != bindings[1].road,
                    "Intersection {:?}: entry and exit must be on different roads",
                    id
                );
            }
            RoutingPolicy::UniformExit => {
                let first = bindings[0].road;
                ensure!(
                    bindings.iter().any(|binding| binding.road != first),
                    "Intersection {:?}: bindings must span at least two roads",
                    id
                );
            }
        }

        Ok(Self {
            id,
            bindings,
            policy,
        })
    }

    /// Bindings at which a vehicle can enter this intersection
    pub fn entries(&self) -> &[RoadBinding] {
        match self.policy {
            RoutingPolicy::FixedProbability(_) => &self.bindings[..1],
            RoutingPolicy::UniformExit => &self.bindings,
        }
    }

    /// Roads this intersection has to be offered vehicles from
    pub fn entry_roads(&self) -> Vec<RoadId> {
        let mut roads: Vec<RoadId> = self.entries().iter().map(|entry| entry.road).collect();
        roads.sort();
        roads.dedup();
        roads
    }

    /// Find the entry the vehicle is currently at, if any
    pub fn nearby_entry(&self, vehicle: &SimVehicle) -> Option<&RoadBinding> {
        self.entries().iter().find(|entry| {
            entry.road == vehicle.road
                && (vehicle.position - entry.position).abs() <= INTERSECTION_TOLERANCE
        })
    }

    pub fn is_near(&self, vehicle: &SimVehicle) -> bool {
        self.nearby_entry(vehicle).is_some()
    }

    /// Decide where a vehicle goes. Returns the exit binding when the
    /// vehicle should switch road, None when it stays where it is.
    pub fn choose_exit<R: Rng + ?Sized>(&self, vehicle: &SimVehicle, rng: &mut R) -> Option<RoadBinding> {
        self.nearby_entry(vehicle)?;

        match self.policy {
            RoutingPolicy::FixedProbability(probability) => {
                rng.random_bool(probability).then_some(self.bindings[1])
            }
            RoutingPolicy::UniformExit => {
                let exits: Vec<RoadBinding> = self
                    .bindings
                    .iter()
                    .filter(|binding| binding.road != vehicle.road)
                    .copied()
                    .collect();
                exits.choose(rng).copied()
            }
        }
    }
}
