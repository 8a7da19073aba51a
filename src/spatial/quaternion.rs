//! Quaternion representation for 3D rotations

use super::Vector3D;
use std::ops::Mul;

/// A quaternion for representing 3D rotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a new quaternion
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create a quaternion from axis-angle representation
    pub fn from_axis_angle(axis: Vector3D, angle_radians: f32) -> Self {
        let half_angle = angle_radians / 2.0;
        let sin_half = half_angle.sin();
        let normalized = axis.normalize();

        Self {
            x: normalized.x * sin_half,
            y: normalized.y * sin_half,
            z: normalized.z * sin_half,
            w: half_angle.cos(),
        }
    }

    /// Extract the rotation from the upper 3x3 of a column-major matrix.
    ///
    /// Columns are normalized first so a scaled world matrix still yields a
    /// unit rotation.
    pub fn from_rotation_matrix(m: &super::Matrix4) -> Self {
        let col = |i: usize| {
            let c = Vector3D::new(m[i * 4], m[i * 4 + 1], m[i * 4 + 2]).normalize();
            [c.x, c.y, c.z]
        };
        let (c0, c1, c2) = (col(0), col(1), col(2));
        // mRC: row R, column C
        let (m11, m12, m13) = (c0[0], c1[0], c2[0]);
        let (m21, m22, m23) = (c0[1], c1[1], c2[1]);
        let (m31, m32, m33) = (c0[2], c1[2], c2[2]);

        let trace = m11 + m22 + m33;
        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    /// Four-component dot product
    pub fn dot(&self, other: &Quaternion) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Get the magnitude of the quaternion
    pub fn magnitude(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize the quaternion
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
                z: self.z / mag,
                w: self.w / mag,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate_vector(&self, v: Vector3D) -> Vector3D {
        let q_vec = Vector3D::new(self.x, self.y, self.z);
        let uv = q_vec.cross(&v);
        let uuv = q_vec.cross(&uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Spherical linear interpolation between two quaternions
    pub fn slerp(&self, other: &Quaternion, t: f32) -> Self {
        let dot = self.dot(other);

        // If the dot product is negative, negate one quaternion to take the shorter path
        let (other, dot) = if dot < 0.0 {
            (Quaternion::new(-other.x, -other.y, -other.z, -other.w), -dot)
        } else {
            (*other, dot)
        };

        // If quaternions are very close, use linear interpolation
        if dot > 0.9995 {
            return Quaternion::new(
                self.x + t * (other.x - self.x),
                self.y + t * (other.y - self.y),
                self.z + t * (other.z - self.z),
                self.w + t * (other.w - self.w),
            )
            .normalize();
        }

        let theta_0 = dot.acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Quaternion::new(
            s0 * self.x + s1 * other.x,
            s0 * self.y + s1 * other.y,
            s0 * self.z + s1 * other.z,
            s0 * self.w + s1 * other.w,
        )
    }

    /// Get the forward vector (where this rotation points)
    pub fn forward(&self) -> Vector3D {
        self.rotate_vector(Vector3D::FORWARD)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 4]> for Quaternion {
    /// glTF order: `[x, y, z, w]`
    fn from(v: [f32; 4]) -> Self {
        Quaternion::new(v[0], v[1], v[2], v[3])
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        Quaternion::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx(a: Vector3D, b: Vector3D) -> bool {
        (a - b).magnitude() < 0.0001
    }

    #[test]
    fn test_identity() {
        let rotated = Quaternion::IDENTITY.rotate_vector(Vector3D::FORWARD);
        assert_eq!(rotated, Vector3D::FORWARD);
    }

    #[test]
    fn test_90_degree_yaw_turns_forward_left() {
        // Positive rotation about +Y takes -Z to -X
        let q = Quaternion::from_axis_angle(Vector3D::UP, PI / 2.0);
        assert!(approx(q.forward(), Vector3D::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_identity_matrix_is_exact_identity() {
        let m = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        assert_eq!(Quaternion::from_rotation_matrix(&m), Quaternion::IDENTITY);
    }

    #[test]
    fn test_matrix_round_trip_for_half_turn() {
        // 180 degrees about Y exercises the non-positive-trace branch
        let m = [
            -1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let q = Quaternion::from_rotation_matrix(&m);
        assert!(approx(q.forward(), Vector3D::new(0.0, 0.0, 1.0)));
        assert!((q.magnitude() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(Vector3D::UP, PI / 2.0);
        let start = a.slerp(&b, 0.0);
        let end = a.slerp(&b, 1.0);
        assert!((start.dot(&a).abs() - 1.0).abs() < 0.0001);
        assert!((end.dot(&b).abs() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_slerp_quarter_way_is_unit_and_on_arc() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(Vector3D::UP, PI / 2.0);
        let q = a.slerp(&b, 0.25);
        let expected = Quaternion::from_axis_angle(Vector3D::UP, PI / 8.0);
        assert!((q.magnitude() - 1.0).abs() < 0.0001);
        assert!((q.dot(&expected) - 1.0).abs() < 0.0001);
    }
}
