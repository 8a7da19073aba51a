//! Spatial primitives for tracked-space placement
//!
//! Uses the right-handed tracking-space convention of WebXR reference spaces:
//! - X: Right (+) / Left (-)
//! - Y: Up (+) / Down (-)
//! - Z: Backward (+) / Forward (-), so controllers and viewers point down -Z

mod point3d;
mod quaternion;
mod transform;
mod vector3d;

pub use point3d::Point3D;
pub use quaternion::Quaternion;
pub use transform::Transform;
pub use vector3d::Vector3D;

/// Column-major 4x4 matrix, the layout tracking runtimes hand out
/// (`XRRigidTransform.matrix`, `Object3D.matrixWorld.elements`).
pub type Matrix4 = [f32; 16];
