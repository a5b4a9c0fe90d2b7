//! Foliage cluster layout by crown archetype.
//!
//! Independent of which branch generator produced the skeleton. All five
//! archetypes share the crown derivation:
//!
//! - `crown_base = height × crown_base_ratio`
//! - `crown_height = height − crown_base`
//! - `crown_width = height × crown_width_ratio` (horizontal radius)

use std::f64::consts::TAU;

use arbor_math::{Aabb3, Point3, GOLDEN_ANGLE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rng::Lcg;
use crate::species::{lookup_species, CrownShape};
use crate::FoliageCluster;

/// Attempts per irregular sample before the last one is kept anyway.
pub const IRREGULAR_ATTEMPTS: usize = 20;

/// Vertical squash applied to spherical satellites.
const SATELLITE_FLATTEN: f64 = 0.7;

/// Foliage layout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Stacked cones narrowing upward.
    Conical,
    /// Central ball with golden-spiral satellites.
    Spherical,
    /// Narrow spindle widest at mid-height.
    Columnar,
    /// Drooping radial fronds under a flat top.
    Umbrella,
    /// Loosely scattered clumps.
    Irregular,
}

impl Archetype {
    /// Default archetype for a species crown shape.
    pub fn for_crown_shape(shape: CrownShape) -> Self {
        match shape {
            CrownShape::Pyramidal => Archetype::Conical,
            CrownShape::Umbrella => Archetype::Umbrella,
            CrownShape::Dome | CrownShape::Oval => Archetype::Spherical,
            CrownShape::Spreading => Archetype::Irregular,
        }
    }

    /// Parse a lowercase archetype name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "conical" => Some(Archetype::Conical),
            "spherical" => Some(Archetype::Spherical),
            "columnar" => Some(Archetype::Columnar),
            "umbrella" => Some(Archetype::Umbrella),
            "irregular" => Some(Archetype::Irregular),
            _ => None,
        }
    }
}

/// Crown style parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageStyle {
    /// Layout strategy.
    pub archetype: Archetype,
    /// Cluster count control in `0..=1`.
    pub density: f64,
    /// Cluster radius multiplier.
    pub size: f64,
    /// Crown base as a fraction of tree height.
    pub crown_base_ratio: f64,
    /// Crown radius as a fraction of tree height.
    pub crown_width_ratio: f64,
}

impl Default for FoliageStyle {
    fn default() -> Self {
        Self {
            archetype: Archetype::Spherical,
            density: 0.6,
            size: 1.0,
            crown_base_ratio: 0.35,
            crown_width_ratio: 0.3,
        }
    }
}

impl FoliageStyle {
    /// Style matching a species' crown proportions.
    pub fn for_species(name: &str) -> Self {
        let species = lookup_species(name);
        let ratio = species.trunk_height_ratio;
        Self {
            archetype: Archetype::for_crown_shape(species.crown_shape),
            crown_base_ratio: ratio,
            crown_width_ratio: (1.0 - ratio) * species.crown_shape.width_ratio(),
            ..Self::default()
        }
    }
}

/// Clusters plus their combined bounding box (`None` when empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoliageResult {
    /// Positioned clusters.
    pub clusters: Vec<FoliageCluster>,
    /// Bounding box of every cluster.
    pub bounds: Option<Aabb3>,
}

struct Crown {
    base: f64,
    height: f64,
    width: f64,
    density: f64,
    size: f64,
}

impl Crown {
    fn count(&self, min: f64, span: f64) -> usize {
        (min + span * self.density).round().max(1.0) as usize
    }
}

/// Lay out foliage clusters for a tree of `tree_height`.
pub fn generate(tree_height: f64, style: &FoliageStyle, seed: u64) -> FoliageResult {
    let mut rng = Lcg::new(seed);
    if tree_height <= 0.0 || style.size <= 0.0 {
        return FoliageResult {
            clusters: Vec::new(),
            bounds: None,
        };
    }
    let base = tree_height * style.crown_base_ratio.clamp(0.0, 0.95);
    let crown = Crown {
        base,
        height: tree_height - base,
        width: tree_height * style.crown_width_ratio.max(0.0),
        density: style.density.clamp(0.0, 1.0),
        size: style.size,
    };

    let clusters = match style.archetype {
        Archetype::Conical => conical(&crown, &mut rng),
        Archetype::Spherical => spherical(&crown, &mut rng),
        Archetype::Columnar => columnar(&crown, &mut rng),
        Archetype::Umbrella => umbrella(&crown, &mut rng),
        Archetype::Irregular => irregular(&crown, &mut rng),
    };

    let bounds = if clusters.is_empty() {
        None
    } else {
        let mut b = Aabb3::empty();
        for c in &clusters {
            b.include_box(&c.center, &c.half_extents());
        }
        Some(b)
    };
    debug!(archetype = ?style.archetype, clusters = clusters.len(), "foliage generated");
    FoliageResult { clusters, bounds }
}

fn conical(c: &Crown, rng: &mut Lcg) -> Vec<FoliageCluster> {
    let layers = c.count(4.0, 8.0).max(2);
    let layer_height = c.height / layers as f64;
    let extras = c.count(2.0, 4.0);
    let mut out = Vec::new();
    for i in 0..layers {
        let t = i as f64 / layers as f64;
        let z = c.base + (i as f64 + 0.5) * layer_height;
        let width = (c.width * (1.0 - t) * c.size).max(c.width * 0.05);
        out.push(FoliageCluster::cone(
            Point3::new(0.0, 0.0, z),
            width,
            width * 0.35,
            layer_height * 1.4,
        ));
        let spin = rng.angle();
        for k in 0..extras {
            let a = spin + k as f64 * GOLDEN_ANGLE;
            let d = width * rng.range(0.55, 0.8);
            out.push(FoliageCluster::sphere(
                Point3::new(
                    d * a.cos(),
                    d * a.sin(),
                    z + layer_height * rng.range(-0.3, 0.3),
                ),
                width * 0.3 * rng.jitter(0.2),
            ));
        }
    }
    out
}

fn spherical(c: &Crown, rng: &mut Lcg) -> Vec<FoliageCluster> {
    let center = Point3::new(0.0, 0.0, c.base + c.height * 0.5);
    let core = c.width.min(c.height * 0.5) * 0.75 * c.size;
    let mut out = vec![FoliageCluster::sphere(center, core)];

    let n = c.count(8.0, 24.0);
    let reach_h = c.width * 0.85;
    let reach_v = c.height * 0.5 * 0.85;
    for i in 0..n {
        let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
        let ring = (1.0 - y * y).sqrt();
        let theta = i as f64 * GOLDEN_ANGLE;
        let spread = rng.range(0.8, 1.05);
        let p = Point3::new(
            center.x + reach_h * ring * theta.cos() * spread,
            center.y + reach_h * ring * theta.sin() * spread,
            center.z + reach_v * y * SATELLITE_FLATTEN * spread,
        );
        let radius = core * 0.4 * rng.jitter(0.25);
        if p.z < c.base {
            continue;
        }
        out.push(FoliageCluster::sphere(p, radius));
    }
    out
}

fn columnar(c: &Crown, rng: &mut Lcg) -> Vec<FoliageCluster> {
    let n = c.count(5.0, 7.0);
    let mut out = Vec::new();
    for i in 0..n {
        let t = (i as f64 + 0.5) / n as f64;
        let z = c.base + t * c.height;
        let width = c.width * (4.0 * t * (1.0 - t)).max(0.15) * c.size;
        out.push(FoliageCluster::sphere(Point3::new(0.0, 0.0, z), width));
        let a0 = rng.angle();
        for k in 0..2 {
            let a = a0 + k as f64 * TAU * 0.5;
            let d = width * 0.8;
            out.push(FoliageCluster::sphere(
                Point3::new(d * a.cos(), d * a.sin(), z + width * rng.range(-0.3, 0.3)),
                width * 0.35 * rng.jitter(0.2),
            ));
        }
    }
    out
}

fn umbrella(c: &Crown, rng: &mut Lcg) -> Vec<FoliageCluster> {
    let fronds = c.count(5.0, 7.0);
    let top = c.base + c.height * 0.85;
    let droop = c.height * 0.35;
    let mut out = Vec::new();
    for i in 0..fronds {
        let a = i as f64 * TAU / fronds as f64 + rng.range(-0.15, 0.15);
        for k in 1..=3 {
            let frac = k as f64 / 3.0;
            let d = c.width * frac;
            out.push(FoliageCluster::sphere(
                Point3::new(d * a.cos(), d * a.sin(), top - droop * frac * frac),
                c.width * 0.28 * c.size * (1.0 - 0.15 * k as f64),
            ));
        }
    }
    out.push(FoliageCluster::sphere(
        Point3::new(0.0, 0.0, top),
        c.width * 0.35 * c.size,
    ));
    out
}

fn irregular(c: &Crown, rng: &mut Lcg) -> Vec<FoliageCluster> {
    let n = c.count(10.0, 30.0);
    let center = Point3::new(0.0, 0.0, c.base + c.height * 0.5);
    let (rx, rz) = (c.width.max(1e-9), (c.height * 0.5).max(1e-9));
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let mut p = center;
        for _ in 0..IRREGULAR_ATTEMPTS {
            p = Point3::new(
                center.x + rng.range(-1.0, 1.0) * rx,
                center.y + rng.range(-1.0, 1.0) * rx,
                center.z + rng.range(-1.0, 1.0) * rz,
            );
            let q = (p - center).component_div(&arbor_math::Vec3::new(rx, rx, rz));
            if q.norm_squared() <= 1.0 {
                break;
            }
        }
        out.push(FoliageCluster::sphere(
            p,
            c.width * 0.25 * c.size * rng.jitter(0.4),
        ));
    }
    out
}
