#![warn(missing_docs)]

//! Math types for arbor tree generation.
//!
//! Thin aliases over nalgebra for the points, vectors and orientations
//! every generator shares, the rotation helpers used to align primitives
//! onto branch axes, and an axis-aligned bounding box.
//!
//! The world is Z-up with the ground at `z = 0`.

use nalgebra::Vector3;

mod aabb;
mod rotation;

pub use aabb::Aabb3;
pub use rotation::{
    euler_xyz_deg, lerp, lerp_vec, orthonormal_basis, slerp, spherical_to_cartesian,
    AxisAlignment, GOLDEN_ANGLE,
};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit quaternion orientation.
pub type Rotation = nalgebra::UnitQuaternion<f64>;
