#![warn(missing_docs)]

//! Boolean solid kernel boundary for arbor.
//!
//! Mesh assembly only needs two primitive constructors, two rigid motions,
//! a pairwise union and a mesh read-out. [`SolidKernel`] names exactly that
//! surface so assembly can run against the manifold-backed kernel in
//! production and against recording kernels in tests.
//!
//! Solids are owned values. Every operation that produces a new solid takes
//! its inputs by value, so the inputs are released as soon as the result
//! exists.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "manifold")] {
//! use arbor_kernel::{ManifoldKernel, SolidKernel};
//!
//! let kernel = ManifoldKernel::init().unwrap();
//! let a = kernel.frustum(1.0, 0.5, 4.0, 16);
//! let b = kernel.sphere(1.0, 16);
//! let both = kernel.union(a, b);
//! assert!(kernel.to_mesh(&both).num_triangles() > 0);
//! # }
//! ```

use arbor_math::Vec3;
use thiserror::Error;

mod mesh;

#[cfg(feature = "manifold")]
mod manifold;

pub use mesh::GeneratedMesh;

#[cfg(feature = "manifold")]
pub use manifold::ManifoldKernel;

/// Errors raised by a kernel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The kernel could not be brought up.
    #[error("kernel initialization failed: {0}")]
    Init(String),
}

/// Result alias for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// The operations mesh assembly needs from a boolean solid kernel.
pub trait SolidKernel {
    /// Owned solid handle. Dropping it releases the underlying resource.
    type Solid;

    /// Bring the kernel up.
    fn init() -> Result<Self>
    where
        Self: Sized;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Truncated cone along +Z with its base at the origin.
    fn frustum(&self, r_bottom: f64, r_top: f64, height: f64, segments: u32) -> Self::Solid;

    /// Sphere centered at the origin.
    fn sphere(&self, radius: f64, segments: u32) -> Self::Solid;

    /// Rotate by Euler angles in degrees, applied about X, then Y, then Z.
    fn rotate(&self, solid: Self::Solid, x_deg: f64, y_deg: f64, z_deg: f64) -> Self::Solid;

    /// Translate by `offset`.
    fn translate(&self, solid: Self::Solid, offset: &Vec3) -> Self::Solid;

    /// Union of two solids. Both operands are consumed.
    fn union(&self, a: Self::Solid, b: Self::Solid) -> Self::Solid;

    /// Whether the solid has no volume.
    fn is_empty(&self, solid: &Self::Solid) -> bool;

    /// Read the solid out as a triangle mesh.
    fn to_mesh(&self, solid: &Self::Solid) -> GeneratedMesh;
}
