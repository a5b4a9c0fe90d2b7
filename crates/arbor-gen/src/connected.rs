//! Connected-growth generator.
//!
//! Every segment starts at an end point produced earlier. After a warm-up,
//! new end points occasionally link to a nearby existing end point, giving
//! a lattice-like crown that prints as one piece.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::growth::Crown;
use crate::BranchSegment;

/// Branches grown before loops are considered.
pub const WARM_UP: usize = 6;

/// Chance of a loop segment after each branch past the warm-up.
pub const LOOP_PROBABILITY: f64 = 0.2;

/// Loop partner search radius as a fraction of height.
pub const LOOP_REACH: f64 = 0.18;

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectedParams {
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
    /// Trunk base radius as a fraction of height.
    pub trunk_ratio: f64,
}

impl Default for ConnectedParams {
    fn default() -> Self {
        Self {
            height: 15.0,
            min_radius: 0.03,
            model_scale: 1.0,
            seed: 42,
            branch_count: 40,
            trunk_ratio: 0.035,
        }
    }
}

/// Generate a connected skeleton.
pub fn generate(params: &ConnectedParams) -> Vec<BranchSegment> {
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
    let reach = LOOP_REACH * params.height;
    let mut grown = 0;
    let mut loops = 0;

    for k in 0..params.branch_count {
        let Some(idx) = crown.extend(k as f64 / params.branch_count as f64) else {
            continue;
        };
        grown += 1;
        if grown <= WARM_UP || !crown.rng.chance(LOOP_PROBABILITY) {
            continue;
        }
        let new = crown.endpoints[idx];
        let partner = crown
            .endpoints
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != idx && Some(j) != new.parent)
            .map(|(j, e)| (j, (e.point - new.point).norm()))
            .filter(|&(_, d)| d > 1e-6 && d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((j, _)) = partner {
            let r = crown.segments.last().map_or(crown.floor, |s| s.r2);
            crown.segments.push(BranchSegment::new(
                new.point,
                crown.endpoints[j].point,
                r,
                r,
                new.level + 1,
            ));
            loops += 1;
        }
    }

    debug!(
        segments = crown.segments.len(),
        loops,
        "connected skeleton generated"
    );
    crown.segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let p = ConnectedParams::default();
        assert_eq!(generate(&p), generate(&p));
    }

    #[test]
    fn test_every_segment_starts_at_known_endpoint() {
        for seed in 0..8 {
            let p = ConnectedParams {
                seed,
                branch_count: 60,
                ..ConnectedParams::default()
            };
            let segs = generate(&p);
            for (i, s) in segs.iter().enumerate().skip(1) {
                assert!(
                    segs[..i].iter().any(|prev| prev.end == s.start),
                    "seed {seed} segment {i}"
                );
            }
        }
    }

    #[test]
    fn test_loops_are_short() {
        let mut total = 0;
        for seed in 0..4 {
            let p = ConnectedParams {
                seed,
                branch_count: 80,
                ..ConnectedParams::default()
            };
            let reach = LOOP_REACH * p.height;
            let segs = generate(&p);
            // Loop segments have constant radius; grown branches taper.
            let loops: Vec<_> = segs.iter().filter(|s| s.level > 0 && s.r1 == s.r2).collect();
            for l in &loops {
                assert!(l.length() <= reach + 1e-9, "seed {seed}");
            }
            total += loops.len();
        }
        assert!(total > 0);
    }
}
