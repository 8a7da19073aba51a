//! Placement of spawned primitives

mod controller;
mod geometry;

pub use controller::{InstanceId, PlacedInstance, PlacementController};
pub use geometry::{GeometryVariant, Material};
