//! Spawned instances anchored to the controller pose

use super::geometry::{GeometryVariant, Material};
use crate::config::PlacementConfig;
use crate::spatial::{Point3D, Transform};
use crate::tracking::TrackingPose;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use tracing::debug;

/// Stable identifier of a placed instance within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// A spawned primitive. Its transform never changes after spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedInstance {
    pub id: InstanceId,
    pub geometry: GeometryVariant,
    pub material_seed: u64,
    pub material: Material,
    /// World transform captured at the trigger
    pub transform: Transform,
    /// Controller frame counter at spawn
    pub spawn_frame: u64,
}

impl PlacedInstance {
    /// Transform to draw at `frame`, with the accumulated Y spin applied
    pub fn draw_transform(&self, frame: u64, spin_per_frame: f32) -> Transform {
        let frames = frame.saturating_sub(self.spawn_frame) as f32;
        self.transform.rotated_local_y(spin_per_frame * frames)
    }
}

/// Owns every instance spawned in a session.
///
/// The random source is injected so tests can fix the seed; production uses
/// an entropy-seeded [`StdRng`].
pub struct PlacementController {
    palette: Vec<GeometryVariant>,
    offset: Point3D,
    spin_per_frame: f32,
    shininess: f32,
    rng: Box<dyn RngCore + Send>,
    instances: Vec<PlacedInstance>,
    frame: u64,
}

impl PlacementController {
    pub fn new(config: &PlacementConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &PlacementConfig, rng: impl RngCore + Send + 'static) -> Self {
        let palette = if config.palette.is_empty() {
            GeometryVariant::default_palette()
        } else {
            config.palette.clone()
        };
        Self {
            palette,
            offset: Point3D::from(config.offset),
            spin_per_frame: config.spin_per_frame,
            shininess: config.shininess,
            rng: Box::new(rng),
            instances: Vec::new(),
            frame: 0,
        }
    }

    /// Draw a variant seed from the injected random source
    pub fn roll_variant(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Spawn an instance in front of `pose`.
    ///
    /// The variant is `palette[variant_seed % len]`. The position is the
    /// configured local offset carried through the pose's world transform and
    /// the orientation is the pose's own.
    pub fn place(&mut self, variant_seed: u64, pose: &TrackingPose) -> PlacedInstance {
        let geometry = self.palette[(variant_seed % self.palette.len() as u64) as usize];
        let material_seed = self.rng.next_u64();
        let instance = PlacedInstance {
            id: InstanceId(self.instances.len() as u64),
            geometry,
            material_seed,
            material: Material::from_seed(material_seed, self.shininess),
            transform: Transform::from_position_rotation(
                pose.local_to_world(self.offset),
                pose.transform.rotation,
            ),
            spawn_frame: self.frame,
        };
        debug!(
            "Placed {} {} at ({:.3}, {:.3}, {:.3})",
            geometry.tag(),
            instance.id,
            instance.transform.position.x,
            instance.transform.position.y,
            instance.transform.position.z
        );
        self.instances.push(instance);
        instance
    }

    /// Every instance placed so far, in placement order
    pub fn all(&self) -> &[PlacedInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Count one rendered frame
    pub fn tick(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current draw transforms, spin included
    pub fn draw_transforms(&self) -> impl Iterator<Item = (&PlacedInstance, Transform)> + '_ {
        self.instances
            .iter()
            .map(move |i| (i, i.draw_transform(self.frame, self.spin_per_frame)))
    }
}

impl fmt::Debug for PlacementController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementController")
            .field("palette", &self.palette)
            .field("instances", &self.instances.len())
            .field("frame", &self.frame)
            .finish()
    }
}
