//! Traffic Microsimulation Library
//!
//! A discrete-time traffic simulation that runs headless, driven either by
//! code or by a JSON scenario file.

pub mod scenario;
pub mod simulation;
