#![warn(missing_docs)]

//! Procedural tree generation for arbor.
//!
//! Produces the primitive stream that mesh assembly consumes: tapered
//! branch segments from one of several skeleton strategies, plus foliage
//! clusters laid out by crown archetype. Every generator is deterministic
//! for a given seed.
//!
//! # Example
//!
//! ```
//! use arbor_gen::realistic::{self, RealisticParams};
//!
//! let params = RealisticParams {
//!     species: "spruce".into(),
//!     ..RealisticParams::default()
//! };
//! let segments = realistic::generate(&params);
//! assert!(!segments.is_empty());
//! ```

use arbor_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

pub mod attractor;
pub mod connected;
pub mod envelope;
pub mod foliage;
mod growth;
pub mod lsystem;
pub mod organic;
pub mod realistic;
pub mod rng;
pub mod species;

pub use envelope::CrownEnvelope;
pub use foliage::{Archetype, FoliageResult, FoliageStyle};
pub use rng::Lcg;
pub use species::{lookup_age, lookup_species, AgeModifier, CrownShape, SpeciesPreset};

/// A tapered cylinder from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchSegment {
    /// Base of the segment.
    pub start: Point3,
    /// Tip of the segment.
    pub end: Point3,
    /// Radius at `start`.
    pub r1: f64,
    /// Radius at `end`.
    pub r2: f64,
    /// Recursion level that emitted the segment (0 for trunk-like parts).
    pub level: u32,
}

impl BranchSegment {
    /// Create a segment.
    pub fn new(start: Point3, end: Point3, r1: f64, r2: f64, level: u32) -> Self {
        Self {
            start,
            end,
            r1,
            r2,
            level,
        }
    }

    /// Vector from start to end.
    pub fn axis(&self) -> Vec3 {
        self.end - self.start
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.axis().norm()
    }

    /// Mean of both end radii.
    pub fn average_radius(&self) -> f64 {
        (self.r1 + self.r2) * 0.5
    }
}

/// Primitive used to realize a foliage cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    /// A sphere of `radius`.
    Sphere,
    /// A cone (or frustum) from `radius` to `top_radius`.
    Cone,
    /// A straight cylinder of `radius`.
    Cylinder,
}

/// A positioned foliage primitive.
///
/// Cones and cylinders are centered on `center`, with their base at
/// `center.z - height / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoliageCluster {
    /// Center of the primitive.
    pub center: Point3,
    /// Radius (base radius for cones).
    pub radius: f64,
    /// Primitive kind.
    pub kind: ClusterKind,
    /// Height for cones and cylinders.
    pub height: Option<f64>,
    /// Top radius for cones.
    pub top_radius: Option<f64>,
}

impl FoliageCluster {
    /// A sphere cluster.
    pub fn sphere(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            kind: ClusterKind::Sphere,
            height: None,
            top_radius: None,
        }
    }

    /// A cone cluster tapering from `radius` to `top_radius` over `height`.
    pub fn cone(center: Point3, radius: f64, top_radius: f64, height: f64) -> Self {
        Self {
            center,
            radius,
            kind: ClusterKind::Cone,
            height: Some(height),
            top_radius: Some(top_radius),
        }
    }

    /// A cylinder cluster.
    pub fn cylinder(center: Point3, radius: f64, height: f64) -> Self {
        Self {
            center,
            radius,
            kind: ClusterKind::Cylinder,
            height: Some(height),
            top_radius: None,
        }
    }

    /// Half extents of the cluster's bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match self.kind {
            ClusterKind::Sphere => Vec3::repeat(self.radius),
            ClusterKind::Cone | ClusterKind::Cylinder => {
                let r = self.radius.max(self.top_radius.unwrap_or(0.0));
                let h = self.height.unwrap_or(self.radius * 2.0);
                Vec3::new(r, r, h * 0.5)
            }
        }
    }
}
