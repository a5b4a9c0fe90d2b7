//! Organic "cloud crown" generator: free growth plus decorative rings.
//!
//! Rings are closed polygons of thin segments passing through branch end
//! points, so the output is not a strict tree.

use std::f64::consts::TAU;

use arbor_math::{orthonormal_basis, spherical_to_cartesian};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::growth::Crown;
use crate::BranchSegment;

/// Chords per ring.
pub const RING_CHORDS: usize = 8;

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganicParams {
    /// Total tree height.
    pub height: f64,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Model units to output units.
    pub model_scale: f64,
    /// Random seed.
    pub seed: u64,
    /// Growth iterations.
    pub branch_count: usize,
    /// Closed rings added after growth.
    pub loop_count: usize,
    /// Trunk base radius as a fraction of height.
    pub trunk_ratio: f64,
}

impl Default for OrganicParams {
    fn default() -> Self {
        Self {
            height: 15.0,
            min_radius: 0.03,
            model_scale: 1.0,
            seed: 42,
            branch_count: 40,
            loop_count: 4,
            trunk_ratio: 0.035,
        }
    }
}

/// Generate an organic skeleton: trunk, grown branches, then rings.
pub fn generate(params: &OrganicParams) -> Vec<BranchSegment> {
    if params.height <= 0.0 {
        return Vec::new();
    }
    let mut crown = Crown::new(
        params.height,
        params.height * params.trunk_ratio,
        params.min_radius,
        params.model_scale,
        params.seed,
    );
    for k in 0..params.branch_count {
        crown.extend(k as f64 / params.branch_count as f64);
    }

    let ring_radius = (crown.trunk_top_radius * 0.15).max(crown.floor);
    for _ in 0..params.loop_count {
        let anchor = crown.endpoints[crown.rng.below(crown.endpoints.len())];
        let size = 0.06 * params.height * crown.rng.jitter(0.3);
        let azimuth = crown.rng.angle();
        let tilt = crown.rng.range(0.0, 1.2);
        let normal = spherical_to_cartesian(azimuth, tilt);
        let (u, v) = orthonormal_basis(&normal);
        // Ring passes through the anchor at angle zero.
        let center = anchor.point - u * size;
        let at = |j: usize| {
            let theta = TAU * j as f64 / RING_CHORDS as f64;
            center + (u * theta.cos() + v * theta.sin()) * size
        };
        for j in 0..RING_CHORDS {
            crown.segments.push(BranchSegment::new(
                at(j),
                at(j + 1),
                ring_radius,
                ring_radius,
                anchor.level + 1,
            ));
        }
    }

    debug!(
        segments = crown.segments.len(),
        endpoints = crown.endpoints.len(),
        rings = params.loop_count,
        "organic skeleton generated"
    );
    crown.segments
}
