//! Envelope-constrained recursive branching.
//!
//! The tree is a trunk, a tapering leader through the crown, and tiers of
//! primary branches that recurse with species-specific decay. Every branch
//! end point is clamped onto an ellipsoidal [`CrownEnvelope`], which keeps
//! the silhouette believable regardless of recursion depth.

use arbor_math::{lerp_vec, orthonormal_basis, spherical_to_cartesian, Point3, Vec3, GOLDEN_ANGLE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::envelope::CrownEnvelope;
use crate::rng::Lcg;
use crate::species::{lookup_age, lookup_species, AgeModifier, SpeciesPreset};
use crate::BranchSegment;

/// End radius over start radius for every emitted segment.
pub const TAPER: f64 = 0.85;

/// Requested or clamped lengths below this are dropped.
pub const MIN_LENGTH: f64 = 1e-3;

/// Children spawned per branch never exceed this.
const MAX_CHILDREN: u32 = 4;

/// Weight pulling terminal directions toward the envelope normal.
const NORMAL_BLEND: f64 = 0.35;

/// Default cap on emitted segments, trunk and leader included.
pub const DEFAULT_SEGMENT_BUDGET: usize = 600;

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealisticParams {
    /// Total tree height in model units.
    pub height: f64,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Random seed.
    pub seed: u64,
    /// Species name (see [`crate::species`]).
    pub species: String,
    /// Age category name.
    pub age: String,
    /// Crown width multiplier.
    pub crown_width: f64,
    /// Overrides the species trunk height ratio.
    pub trunk_height: Option<f64>,
    /// Multiplies the age branch density.
    pub crown_density: Option<f64>,
    /// Model units to output units, used for the printability test.
    pub model_scale: f64,
    /// Overrides the species/age recursion depth. Clamped to `1..=15`.
    pub max_depth: Option<u32>,
    /// Upper bound on the number of emitted segments.
    pub segment_budget: usize,
}

impl Default for RealisticParams {
    fn default() -> Self {
        Self {
            height: 15.0,
            min_radius: 0.03,
            seed: 42,
            species: "oak".into(),
            age: "mature".into(),
            crown_width: 1.0,
            trunk_height: None,
            crown_density: None,
            model_scale: 1.0,
            max_depth: None,
            segment_budget: DEFAULT_SEGMENT_BUDGET,
        }
    }
}

impl RealisticParams {
    /// Recursion depth after applying age and override, in `1..=15`.
    pub fn effective_max_depth(&self) -> u32 {
        match self.max_depth {
            Some(d) => d.clamp(1, 15),
            None => crate::species::effective_max_depth(
                &lookup_species(&self.species),
                &lookup_age(&self.age),
            ),
        }
    }
}

/// Upward bias added to a child direction's Z component at `depth`.
///
/// Negative `tip_curvature` gives a downward (drooping) bias.
pub fn phototropism_bias(tip_curvature: f64, depth: u32) -> f64 {
    tip_curvature * 0.15 * (depth as f64 + 1.0)
}

/// The crown envelope `generate` uses for these parameters.
pub fn crown_envelope(params: &RealisticParams) -> CrownEnvelope {
    let species = lookup_species(&params.species);
    let layout = Layout::new(params, &species, &lookup_age(&params.age));
    layout.envelope
}

struct Layout {
    crown_base: f64,
    crown_height: f64,
    crown_radius: f64,
    trunk_radius: f64,
    envelope: CrownEnvelope,
}

impl Layout {
    fn new(params: &RealisticParams, species: &SpeciesPreset, age: &AgeModifier) -> Self {
        let height = params.height;
        let ratio = params
            .trunk_height
            .unwrap_or(species.trunk_height_ratio)
            .clamp(0.0, 0.95);
        let crown_base = height * ratio;
        let crown_height = height - crown_base;

        let basis = if species.crown_shape.is_conifer() {
            height
        } else {
            crown_base.max(height * 0.2)
        };
        let floor = params.min_radius / (TAPER * params.model_scale);
        let trunk_radius =
            (basis * species.trunk_diameter_ratio * 0.5 * age.trunk_thickness).max(floor);

        let crown_radius =
            crown_height * species.crown_shape.width_ratio() * params.crown_width.max(0.05);
        let envelope = CrownEnvelope::for_crown(crown_base, crown_height, crown_radius);

        Self {
            crown_base,
            crown_height,
            crown_radius,
            trunk_radius,
            envelope,
        }
    }
}

struct Grower<'a> {
    species: &'a SpeciesPreset,
    irregularity: f64,
    max_depth: u32,
    min_radius: f64,
    model_scale: f64,
    envelope: CrownEnvelope,
    rng: Lcg,
    out: Vec<BranchSegment>,
}

impl Grower<'_> {
    fn printable(&self, r: f64) -> bool {
        r * self.model_scale >= self.min_radius
    }

    /// Emit one branch and recurse into its children. Emits at most
    /// `budget` segments and returns how many it emitted.
    fn grow(
        &mut self,
        start: Point3,
        dir: Vec3,
        length: f64,
        radius: f64,
        depth: u32,
        budget: usize,
    ) -> usize {
        if budget == 0
            || depth >= self.max_depth
            || length < MIN_LENGTH
            || !self.printable(radius * TAPER)
        {
            return 0;
        }
        let target = start + dir * length;
        let end = self.envelope.clamp_segment(&start, &target);
        if (end - start).norm() < MIN_LENGTH {
            return 0;
        }
        self.out
            .push(BranchSegment::new(start, end, radius, radius * TAPER, depth + 1));
        let mut used = 1;

        let children = self.species.terminal_branches.min(MAX_CHILDREN);
        let spin = self.rng.angle();
        let base_polar = self.species.base_angle.to_radians() * (1.0 - 0.12 * depth as f64);
        let spread = self.species.angle_variation.to_radians() * (1.0 + self.irregularity);
        let (u, v) = orthonormal_basis(&dir);
        let terminal = depth + 2 >= self.max_depth;

        for i in 0..children {
            let child_radius = radius * self.species.radius_decay * self.rng.jitter(0.1);
            let child_length = length * self.species.length_decay * self.rng.jitter(0.15);
            let azimuth = spin + i as f64 * GOLDEN_ANGLE + self.rng.range(-0.2, 0.2);
            let polar = (base_polar + self.rng.range(-spread, spread)).clamp(0.05, 3.0);

            let (sp, cp) = polar.sin_cos();
            let mut child = dir * cp + (u * azimuth.cos() + v * azimuth.sin()) * sp;
            if terminal {
                let normal = self.envelope.outward_normal(&end);
                child = lerp_vec(&child, &normal, NORMAL_BLEND);
            }
            child.z += phototropism_bias(self.species.tip_curvature, depth);
            let len = child.norm();
            if len < 1e-9 {
                continue;
            }
            // Split what is left evenly over the remaining siblings.
            let share = (budget - used) / (children - i) as usize;
            used += self.grow(end, child / len, child_length, child_radius, depth + 1, share);
        }
        used
    }
}

/// Generate a realistic branch skeleton.
///
/// Output order is trunk, leader segments, then branches depth-first per
/// tier. Unknown species or age names fall back to the defaults.
pub fn generate(params: &RealisticParams) -> Vec<BranchSegment> {
    let species = lookup_species(&params.species);
    let age = lookup_age(&params.age);
    let layout = Layout::new(params, &species, &age);
    let density = age.branch_density * params.crown_density.unwrap_or(1.0).max(0.0);

    let mut g = Grower {
        species: &species,
        irregularity: age.irregularity,
        max_depth: params.effective_max_depth(),
        min_radius: params.min_radius,
        model_scale: params.model_scale,
        envelope: layout.envelope,
        rng: Lcg::new(params.seed),
        out: Vec::new(),
    };

    if params.height <= 0.0 {
        return g.out;
    }

    // Trunk
    let trunk_top = Point3::new(0.0, 0.0, layout.crown_base);
    let r0 = layout.trunk_radius;
    if layout.crown_base > MIN_LENGTH {
        g.out
            .push(BranchSegment::new(Point3::origin(), trunk_top, r0, r0 * TAPER, 0));
    }

    // Leader
    let leader_len = layout.crown_height * species.leader_ratio;
    let leader_parts = if g.rng.chance(0.5) { 3 } else { 2 };
    let step = leader_len / leader_parts as f64;
    let mut leader = Vec::with_capacity(leader_parts);
    let mut pos = trunk_top;
    let mut r = r0 * TAPER;
    for _ in 0..leader_parts {
        if step < MIN_LENGTH || !g.printable(r * TAPER) {
            break;
        }
        let next = pos + Vec3::z() * step;
        let seg = BranchSegment::new(pos, next, r, r * TAPER, 0);
        leader.push(seg);
        g.out.push(seg);
        pos = next;
        r *= TAPER;
    }
    let leader_top = pos.z;

    // Tiers
    let tiers = ((3.0 + 0.3 * layout.crown_height) * density)
        .round()
        .clamp(3.0, 16.0) as usize;
    let base_polar = species.base_angle.to_radians();
    let spread = species.angle_variation.to_radians() * (1.0 + age.irregularity);

    for tier in 0..tiers {
        let frac = (tier as f64 + 0.5) / tiers as f64;
        let z = layout.crown_base + (leader_top - layout.crown_base) * frac;
        let h = if layout.crown_height > 0.0 {
            (z - layout.crown_base) / layout.crown_height
        } else {
            0.0
        };
        let available = layout.crown_radius * species.crown_shape.radial_profile(h);
        let host_radius = radius_at(&leader, z).unwrap_or(r0 * TAPER);
        let count = (species.branches_per_tier * density * g.rng.jitter(0.2))
            .round()
            .max(1.0) as usize;
        let tier_offset = g.rng.angle();
        let remaining = params.segment_budget.saturating_sub(g.out.len());
        let mut tier_budget = remaining / (tiers - tier);

        for i in 0..count {
            let azimuth = tier_offset + i as f64 * GOLDEN_ANGLE + g.rng.range(-0.3, 0.3);
            let polar = (base_polar + g.rng.range(-spread, spread)).clamp(0.05, 3.0);
            let dir = spherical_to_cartesian(azimuth, polar);
            let length = available * g.rng.jitter(0.1) / polar.sin().max(0.5);
            let radius = host_radius * species.radius_decay * g.rng.jitter(0.1);
            let share = tier_budget / (count - i);
            tier_budget -= g.grow(Point3::new(0.0, 0.0, z), dir, length, radius, 0, share);
        }
    }

    debug!(
        species = %params.species,
        segments = g.out.len(),
        tiers,
        "realistic skeleton generated"
    );
    g.out
}

fn radius_at(leader: &[BranchSegment], z: f64) -> Option<f64> {
    leader.iter().find(|s| z <= s.end.z).map(|s| {
        let span = s.end.z - s.start.z;
        let t = if span > 0.0 { (z - s.start.z) / span } else { 0.0 };
        s.r1 + (s.r2 - s.r1) * t.clamp(0.0, 1.0)
    })
}
