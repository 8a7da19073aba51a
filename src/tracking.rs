//! Per-frame tracking pose supplied by the tracking runtime

use crate::spatial::{Matrix4, Point3D, Transform, Vector3D};

/// Pose of a tracked controller (or viewer) for one frame.
///
/// Poses are ephemeral: the session keeps the current frame's pose only, and
/// a placed instance captures a snapshot of it in its own transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingPose {
    /// World transform of the tracked space
    pub transform: Transform,
}

impl TrackingPose {
    /// Pose at the tracking origin
    pub fn identity() -> Self {
        Self {
            transform: Transform::identity(),
        }
    }

    pub fn from_transform(transform: Transform) -> Self {
        Self { transform }
    }

    /// Build from a column-major world matrix (`matrixWorld`-style)
    pub fn from_matrix(matrix: &Matrix4) -> Self {
        Self {
            transform: Transform::from_matrix(matrix),
        }
    }

    /// Forward (pointing) direction of the tracked device
    pub fn forward(&self) -> Vector3D {
        self.transform.forward()
    }

    /// Map an offset expressed in the pose's local frame into world space
    pub fn local_to_world(&self, offset: Point3D) -> Point3D {
        self.transform.transform_point(offset)
    }
}

impl Default for TrackingPose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Quaternion;
    use std::f32::consts::PI;

    #[test]
    fn test_identity_points_down_negative_z() {
        let pose = TrackingPose::identity();
        assert_eq!(pose.forward(), Vector3D::FORWARD);
    }

    #[test]
    fn test_local_offset_follows_orientation() {
        let rotation = Quaternion::from_axis_angle(Vector3D::UP, PI / 2.0);
        let pose = TrackingPose::from_transform(Transform::from_position_rotation(
            Point3D::new(1.0, 1.0, 0.0),
            rotation,
        ));
        let tip = pose.local_to_world(Point3D::new(0.0, 0.0, -1.0));
        assert!(tip.distance(&Point3D::new(0.0, 1.0, 0.0)) < 0.0001);
    }
}
