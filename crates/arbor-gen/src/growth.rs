//! Progress-scheduled crown growth shared by the organic and connected
//! generators.

use arbor_math::{Point3, Vec3};

use crate::rng::Lcg;
use crate::BranchSegment;

/// Fraction of the height where the trunk ends and the crown begins.
pub(crate) const CROWN_BASE_RATIO: f64 = 0.35;

const TRUNK_PARTS: usize = 3;
const TRUNK_TAPER_STEP: f64 = 0.12;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint {
    pub point: Point3,
    pub level: u32,
    /// Endpoint this one grew from.
    pub parent: Option<usize>,
}

pub(crate) struct Crown {
    pub height: f64,
    pub floor: f64,
    pub trunk_top_radius: f64,
    pub rng: Lcg,
    pub segments: Vec<BranchSegment>,
    pub endpoints: Vec<Endpoint>,
}

impl Crown {
    /// Emit the trunk and seed the endpoint list with its top.
    pub fn new(height: f64, trunk_radius: f64, min_radius: f64, model_scale: f64, seed: u64) -> Self {
        let floor = min_radius / model_scale;
        let r0 = trunk_radius.max(floor / (1.0 - TRUNK_TAPER_STEP * TRUNK_PARTS as f64));
        let crown_base = height * CROWN_BASE_RATIO;
        let step = crown_base / TRUNK_PARTS as f64;

        let mut segments = Vec::new();
        for i in 0..TRUNK_PARTS {
            let r1 = r0 * (1.0 - TRUNK_TAPER_STEP * i as f64);
            let r2 = r0 * (1.0 - TRUNK_TAPER_STEP * (i + 1) as f64);
            segments.push(BranchSegment::new(
                Point3::new(0.0, 0.0, step * i as f64),
                Point3::new(0.0, 0.0, step * (i + 1) as f64),
                r1,
                r2,
                0,
            ));
        }
        let trunk_top_radius = r0 * (1.0 - TRUNK_TAPER_STEP * TRUNK_PARTS as f64);

        Self {
            height,
            floor,
            trunk_top_radius,
            rng: Lcg::new(seed),
            segments,
            endpoints: vec![Endpoint {
                point: Point3::new(0.0, 0.0, crown_base),
                level: 0,
                parent: None,
            }],
        }
    }

    /// Grow one branch at generation progress `progress` in `[0, 1)`.
    ///
    /// Returns the index of the new endpoint, or `None` when the branch
    /// would be thinner than the printable floor.
    pub fn extend(&mut self, progress: f64) -> Option<usize> {
        let parent = self.rng.below(self.endpoints.len());
        let azimuth = self.rng.angle();
        let u = self.rng.range(0.3, 0.85);
        let horizontal = Vec3::new(azimuth.cos(), azimuth.sin(), 0.0);
        let dir = (horizontal * (1.0 - u) + Vec3::z() * u).normalize();
        let length = 0.28 * self.height * (1.0 - 0.6 * progress) * self.rng.jitter(0.2);
        let r1 = self.trunk_top_radius * 0.6 * (1.0 - 0.7 * progress);
        let r2 = r1 * 0.8;
        if r2 < self.floor {
            return None;
        }

        let from = self.endpoints[parent];
        let end = from.point + dir * length;
        self.segments
            .push(BranchSegment::new(from.point, end, r1, r2, from.level + 1));
        self.endpoints.push(Endpoint {
            point: end,
            level: from.level + 1,
            parent: Some(parent),
        });
        Some(self.endpoints.len() - 1)
    }
}
