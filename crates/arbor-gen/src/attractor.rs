//! Lorenz attractor rendered as a constant-radius polyline ("abstract" mode).

use arbor_math::{Aabb3, Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rng::Lcg;
use crate::BranchSegment;

const SIGMA: f64 = 10.0;
const RHO: f64 = 28.0;
const BETA: f64 = 8.0 / 3.0;

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractorParams {
    /// Height of the fitted curve.
    pub height: f64,
    /// Tube radius.
    pub radius: f64,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Model units to output units.
    pub model_scale: f64,
    /// Perturbs the starting point.
    pub seed: u64,
    /// Emitted polyline points.
    pub points: usize,
    /// Integration steps between emitted points.
    pub stride: usize,
    /// Integration steps discarded before emitting.
    pub warm_up: usize,
    /// Integration time step.
    pub dt: f64,
}

impl Default for AttractorParams {
    fn default() -> Self {
        Self {
            height: 15.0,
            radius: 0.12,
            min_radius: 0.03,
            model_scale: 1.0,
            seed: 42,
            points: 400,
            stride: 4,
            warm_up: 1000,
            dt: 0.005,
        }
    }
}

fn derivative(p: &Vec3) -> Vec3 {
    Vec3::new(
        SIGMA * (p.y - p.x),
        p.x * (RHO - p.z) - p.y,
        p.x * p.y - BETA * p.z,
    )
}

fn rk4_step(p: &Vec3, dt: f64) -> Vec3 {
    let k1 = derivative(p);
    let k2 = derivative(&(p + k1 * (dt * 0.5)));
    let k3 = derivative(&(p + k2 * (dt * 0.5)));
    let k4 = derivative(&(p + k3 * dt));
    p + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// Generate the attractor polyline, scaled to `height` and standing on
/// the ground plane centered on the Z axis.
pub fn generate(params: &AttractorParams) -> Vec<BranchSegment> {
    if params.height <= 0.0 || params.points < 2 {
        return Vec::new();
    }
    let mut rng = Lcg::new(params.seed);
    let mut state = Vec3::new(
        1.0 + rng.range(-0.5, 0.5),
        1.0 + rng.range(-0.5, 0.5),
        1.0 + rng.range(-0.5, 0.5),
    );
    for _ in 0..params.warm_up {
        state = rk4_step(&state, params.dt);
    }

    let stride = params.stride.max(1);
    let mut raw = Vec::with_capacity(params.points);
    let mut bounds = Aabb3::empty();
    for _ in 0..params.points {
        for _ in 0..stride {
            state = rk4_step(&state, params.dt);
        }
        let p = Point3::from(state);
        bounds.include_point(&p);
        raw.push(p);
    }

    let size = bounds.size();
    if size.z < 1e-9 {
        return Vec::new();
    }
    let scale = params.height / size.z;
    let center = bounds.center();
    let fit = |p: &Point3| {
        Point3::new(
            (p.x - center.x) * scale,
            (p.y - center.y) * scale,
            (p.z - bounds.min.z) * scale,
        )
    };

    let radius = params.radius.max(params.min_radius / params.model_scale);
    let segments: Vec<BranchSegment> = raw
        .windows(2)
        .map(|w| (fit(&w[0]), fit(&w[1])))
        .filter(|(a, b)| (b - a).norm() > 1e-6)
        .map(|(a, b)| BranchSegment::new(a, b, radius, radius, 0))
        .collect();
    debug!(segments = segments.len(), "attractor curve generated");
    segments
}
