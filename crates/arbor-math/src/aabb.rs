//! Axis-aligned bounding box.

use serde::{Deserialize, Serialize};

use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True until at least one point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include a box of half-extents `half` around `center`.
    pub fn include_box(&mut self, center: &Point3, half: &Vec3) {
        self.include_point(&(center - half));
        self.include_point(&(center + half));
    }

    /// Smallest box containing both.
    pub fn merge(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        if !other.is_empty() {
            out.include_point(&other.min);
            out.include_point(&other.max);
        }
        out
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_then_include() {
        let mut b = Aabb3::empty();
        assert!(b.is_empty());
        b.include_point(&Point3::new(1.0, -2.0, 3.0));
        b.include_point(&Point3::new(-1.0, 2.0, 0.0));
        assert!(!b.is_empty());
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 3.0));
        assert_eq!(b.center(), Point3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_include_box_and_contains() {
        let mut b = Aabb3::empty();
        b.include_box(&Point3::new(0.0, 0.0, 5.0), &Vec3::new(1.0, 1.0, 2.0));
        assert!(b.contains(&Point3::new(0.5, -0.5, 6.9)));
        assert!(!b.contains(&Point3::new(0.0, 0.0, 7.1)));
    }

    #[test]
    fn test_merge_with_empty() {
        let a = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(a.merge(&Aabb3::empty()), a);
        let b = Aabb3::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        assert_eq!(a.merge(&b).max, Point3::new(3.0, 3.0, 3.0));
    }
}
