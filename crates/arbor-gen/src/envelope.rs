//! Ellipsoidal crown envelope.

use arbor_math::{Aabb3, Point3, Vec3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;

/// Shrink applied to clamped points so they land just inside the surface.
const SURFACE_INSET: f64 = 1e-9;

/// Axis-aligned ellipsoid bounding the crown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrownEnvelope {
    /// Center of the ellipsoid.
    pub center: Point3,
    /// Semi-axis lengths along X, Y, Z.
    pub radii: Vec3,
}

impl CrownEnvelope {
    /// Create an envelope. Radii must be positive.
    pub fn new(center: Point3, radii: Vec3) -> Self {
        Self { center, radii }
    }

    /// Envelope for a crown spanning `crown_base..crown_base + crown_height`
    /// with horizontal radius `crown_radius`.
    ///
    /// The vertical semi-axis is `0.55 × crown_height`, leaving a little
    /// headroom above and below the crown.
    pub fn for_crown(crown_base: f64, crown_height: f64, crown_radius: f64) -> Self {
        Self {
            center: Point3::new(0.0, 0.0, crown_base + crown_height * 0.5),
            radii: Vec3::new(crown_radius, crown_radius, crown_height * 0.55),
        }
    }

    fn local(&self, p: &Point3) -> Vec3 {
        (p - self.center).component_div(&self.radii)
    }

    /// Approximate signed distance to the surface: negative inside.
    ///
    /// Exact on the surface and along the axes; elsewhere a first-order
    /// estimate that keeps the correct sign.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        let d = p - self.center;
        let k0 = d.component_div(&self.radii).norm();
        let k1 = d
            .component_div(&self.radii.component_mul(&self.radii))
            .norm();
        if k1 < EPS {
            return -self.radii.min();
        }
        k0 * (k0 - 1.0) / k1
    }

    /// Whether `p` lies inside or within `tolerance` of the surface.
    pub fn contains(&self, p: &Point3, tolerance: f64) -> bool {
        self.signed_distance(p) <= tolerance
    }

    /// Unit surface normal direction at `p` (gradient of the implicit).
    ///
    /// At the center the gradient vanishes; +Z is returned there.
    pub fn outward_normal(&self, p: &Point3) -> Vec3 {
        let g = (p - self.center).component_div(&self.radii.component_mul(&self.radii));
        let len = g.norm();
        if len < EPS {
            Vec3::z()
        } else {
            g / len
        }
    }

    /// Pull `end` back along the line from `start` so it lies on or inside
    /// the envelope.
    ///
    /// Returns `end` unchanged when it is already inside. Otherwise solves
    /// for the far intersection of the segment's line with the ellipsoid and
    /// clamps the parameter to `[0, 1]`. With no intersection the segment
    /// collapses to `start`.
    pub fn clamp_segment(&self, start: &Point3, end: &Point3) -> Point3 {
        if self.signed_distance(end) <= 0.0 {
            return *end;
        }
        let a = self.local(start);
        let b = (end - start).component_div(&self.radii);
        let qa = b.norm_squared();
        if qa < EPS {
            return *start;
        }
        let qb = 2.0 * a.dot(&b);
        let qc = a.norm_squared() - 1.0;
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return *start;
        }
        let t = ((-qb + disc.sqrt()) / (2.0 * qa)).clamp(0.0, 1.0) * (1.0 - SURFACE_INSET);
        start + (end - start) * t
    }

    /// Bounding box of the ellipsoid.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::new(self.center - self.radii, self.center + self.radii)
    }
}
