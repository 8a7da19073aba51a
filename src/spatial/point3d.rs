//! 3D point representation

use std::ops::{Add, Sub};

/// A point in tracking space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    /// Origin point (0, 0, 0)
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new 3D point
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate the Euclidean distance to another point
    pub fn distance(&self, other: &Point3D) -> f32 {
        (*self - *other).magnitude()
    }

    /// Linear interpolation between two points
    pub fn lerp(&self, other: &Point3D, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Convert to a Vector3D (from origin)
    pub fn to_vector(&self) -> super::Vector3D {
        super::Vector3D::new(self.x, self.y, self.z)
    }
}

impl From<[f32; 3]> for Point3D {
    fn from(v: [f32; 3]) -> Self {
        Point3D::new(v[0], v[1], v[2])
    }
}

impl Add<super::Vector3D> for Point3D {
    type Output = Point3D;

    fn add(self, rhs: super::Vector3D) -> Self::Output {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = super::Vector3D;

    fn sub(self, rhs: Self) -> Self::Output {
        super::Vector3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
