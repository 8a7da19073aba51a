//! Transform representing position, rotation, and scale in tracking space

use super::{Matrix4, Point3D, Quaternion, Vector3D};

/// A complete 3D transform (position + rotation + scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3D,
    pub rotation: Quaternion,
    pub scale: Vector3D,
}

impl Transform {
    /// Identity transform (origin, no rotation, unit scale)
    pub fn identity() -> Self {
        Self {
            position: Point3D::ORIGIN,
            rotation: Quaternion::IDENTITY,
            scale: Vector3D::ONE,
        }
    }

    /// Create a transform with just position
    pub fn from_position(position: Point3D) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Point3D, rotation: Quaternion) -> Self {
        Self {
            position,
            rotation,
            scale: Vector3D::ONE,
        }
    }

    /// Decompose a column-major world matrix
    pub fn from_matrix(m: &Matrix4) -> Self {
        let column_len = |i: usize| Vector3D::new(m[i * 4], m[i * 4 + 1], m[i * 4 + 2]).magnitude();
        Self {
            position: Point3D::new(m[12], m[13], m[14]),
            rotation: Quaternion::from_rotation_matrix(m),
            scale: Vector3D::new(column_len(0), column_len(1), column_len(2)),
        }
    }

    /// Compose into a column-major world matrix
    pub fn to_matrix(&self) -> Matrix4 {
        let x = self.rotation.rotate_vector(Vector3D::RIGHT) * self.scale.x;
        let y = self.rotation.rotate_vector(Vector3D::UP) * self.scale.y;
        let z = self.rotation.rotate_vector(Vector3D::new(0.0, 0.0, 1.0)) * self.scale.z;
        let p = self.position;
        [
            x.x, x.y, x.z, 0.0, //
            y.x, y.y, y.z, 0.0, //
            z.x, z.y, z.z, 0.0, //
            p.x, p.y, p.z, 1.0,
        ]
    }

    /// Same transform with a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3D::splat(scale);
        self
    }

    /// Get the forward direction of this transform
    pub fn forward(&self) -> Vector3D {
        self.rotation.forward()
    }

    /// Transform a point from local space to world space
    pub fn transform_point(&self, local: Point3D) -> Point3D {
        let scaled = local.to_vector().scale_by(&self.scale);
        self.position + self.rotation.rotate_vector(scaled)
    }

    /// Linearly interpolate between two transforms
    pub fn lerp(&self, other: &Transform, t: f32) -> Self {
        Self {
            position: self.position.lerp(&other.position, t),
            rotation: self.rotation.slerp(&other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }

    /// Rotate about the transform's own Y axis
    pub fn rotated_local_y(&self, angle_radians: f32) -> Self {
        Self {
            rotation: self.rotation * Quaternion::from_axis_angle(Vector3D::UP, angle_radians),
            ..*self
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
