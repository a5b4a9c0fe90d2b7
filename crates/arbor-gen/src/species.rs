//! Per-species branching geometry and per-age multipliers.
//!
//! Pure data. Lookups are by lowercase name and never fail: an unknown
//! name falls back to [`DEFAULT_SPECIES`] / [`DEFAULT_AGE`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Species used when a name is not in the table.
pub const DEFAULT_SPECIES: &str = "oak";

/// Age category used when a name is not in the table.
pub const DEFAULT_AGE: &str = "mature";

/// Silhouette of the crown, driving the radial branch profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrownShape {
    /// Cone tapering to a point (spruce, fir).
    Pyramidal,
    /// Flat top, widening upward (stone pine, baobab).
    Umbrella,
    /// Rounded top, widest low in the crown (willow).
    Dome,
    /// Lens shape, widest at mid-crown.
    Oval,
    /// Wide lens shape (oak).
    Spreading,
}

impl CrownShape {
    /// Conifer-style crowns take their trunk radius from total height.
    pub fn is_conifer(self) -> bool {
        matches!(self, CrownShape::Pyramidal | CrownShape::Umbrella)
    }

    /// Crown radius as a fraction of crown height.
    pub fn width_ratio(self) -> f64 {
        match self {
            CrownShape::Pyramidal => 0.3,
            CrownShape::Umbrella => 0.55,
            CrownShape::Dome => 0.5,
            CrownShape::Oval => 0.4,
            CrownShape::Spreading => 0.6,
        }
    }

    /// Available radius (fraction of crown radius) at relative crown height `h`.
    pub fn radial_profile(self, h: f64) -> f64 {
        use std::f64::consts::PI;
        let h = h.clamp(0.0, 1.0);
        let p = match self {
            CrownShape::Pyramidal => 1.0 - h,
            CrownShape::Umbrella => 0.25 + 0.75 * h,
            CrownShape::Dome => (PI * (0.35 + 0.65 * h)).sin(),
            CrownShape::Oval | CrownShape::Spreading => (PI * h).sin(),
        };
        p.max(0.12)
    }
}

/// Immutable branching parameters for one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesPreset {
    /// Clear trunk height as a fraction of total height.
    pub trunk_height_ratio: f64,
    /// Trunk diameter as a fraction of the trunk basis length.
    pub trunk_diameter_ratio: f64,
    /// Branch angle from the parent axis, degrees.
    pub base_angle: f64,
    /// Random variation of the branch angle, degrees.
    pub angle_variation: f64,
    /// Child radius / parent radius.
    pub radius_decay: f64,
    /// Child length / parent length.
    pub length_decay: f64,
    /// Crown silhouette.
    pub crown_shape: CrownShape,
    /// Maximum recursion depth.
    pub max_depth: u32,
    /// Children spawned per branch.
    pub terminal_branches: u32,
    /// Leader length as a fraction of crown height.
    pub leader_ratio: f64,
    /// Phototropism; negative values make tips droop.
    pub tip_curvature: f64,
    /// Primary branches per tier.
    pub branches_per_tier: f64,
}

/// Immutable age multipliers composed with a species preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeModifier {
    /// Trunk radius multiplier.
    pub trunk_thickness: f64,
    /// Tier and branch count multiplier.
    pub branch_density: f64,
    /// Extra angular randomness (0 = none).
    pub irregularity: f64,
    /// Added to the species max depth.
    pub depth_adjust: i32,
}

const SPECIES: &[(&str, SpeciesPreset)] = &[
    (
        "oak",
        SpeciesPreset {
            trunk_height_ratio: 0.3,
            trunk_diameter_ratio: 0.2,
            base_angle: 55.0,
            angle_variation: 15.0,
            radius_decay: 0.65,
            length_decay: 0.72,
            crown_shape: CrownShape::Spreading,
            max_depth: 6,
            terminal_branches: 3,
            leader_ratio: 0.35,
            tip_curvature: 0.15,
            branches_per_tier: 4.0,
        },
    ),
    (
        "maple",
        SpeciesPreset {
            trunk_height_ratio: 0.28,
            trunk_diameter_ratio: 0.18,
            base_angle: 45.0,
            angle_variation: 12.0,
            radius_decay: 0.66,
            length_decay: 0.74,
            crown_shape: CrownShape::Oval,
            max_depth: 6,
            terminal_branches: 3,
            leader_ratio: 0.5,
            tip_curvature: 0.25,
            branches_per_tier: 4.0,
        },
    ),
    (
        "birch",
        SpeciesPreset {
            trunk_height_ratio: 0.25,
            trunk_diameter_ratio: 0.12,
            base_angle: 35.0,
            angle_variation: 10.0,
            radius_decay: 0.62,
            length_decay: 0.76,
            crown_shape: CrownShape::Oval,
            max_depth: 6,
            terminal_branches: 3,
            leader_ratio: 0.7,
            tip_curvature: 0.1,
            branches_per_tier: 3.0,
        },
    ),
    (
        "willow",
        SpeciesPreset {
            trunk_height_ratio: 0.25,
            trunk_diameter_ratio: 0.2,
            base_angle: 50.0,
            angle_variation: 15.0,
            radius_decay: 0.64,
            length_decay: 0.78,
            crown_shape: CrownShape::Dome,
            max_depth: 6,
            terminal_branches: 3,
            leader_ratio: 0.3,
            tip_curvature: -0.35,
            branches_per_tier: 4.0,
        },
    ),
    (
        "pine",
        SpeciesPreset {
            trunk_height_ratio: 0.55,
            trunk_diameter_ratio: 0.1,
            base_angle: 60.0,
            angle_variation: 12.0,
            radius_decay: 0.62,
            length_decay: 0.7,
            crown_shape: CrownShape::Umbrella,
            max_depth: 5,
            terminal_branches: 3,
            leader_ratio: 0.4,
            tip_curvature: 0.2,
            branches_per_tier: 4.0,
        },
    ),
    (
        "spruce",
        SpeciesPreset {
            trunk_height_ratio: 0.02,
            trunk_diameter_ratio: 0.05,
            base_angle: 80.0,
            angle_variation: 8.0,
            radius_decay: 0.6,
            length_decay: 0.62,
            crown_shape: CrownShape::Pyramidal,
            max_depth: 5,
            terminal_branches: 2,
            leader_ratio: 1.0,
            tip_curvature: -0.25,
            branches_per_tier: 5.0,
        },
    ),
    (
        "fir",
        SpeciesPreset {
            trunk_height_ratio: 0.05,
            trunk_diameter_ratio: 0.05,
            base_angle: 75.0,
            angle_variation: 8.0,
            radius_decay: 0.6,
            length_decay: 0.62,
            crown_shape: CrownShape::Pyramidal,
            max_depth: 5,
            terminal_branches: 2,
            leader_ratio: 0.95,
            tip_curvature: -0.1,
            branches_per_tier: 5.0,
        },
    ),
    (
        "cedar",
        SpeciesPreset {
            trunk_height_ratio: 0.15,
            trunk_diameter_ratio: 0.07,
            base_angle: 70.0,
            angle_variation: 12.0,
            radius_decay: 0.62,
            length_decay: 0.66,
            crown_shape: CrownShape::Pyramidal,
            max_depth: 5,
            terminal_branches: 3,
            leader_ratio: 0.8,
            tip_curvature: 0.05,
            branches_per_tier: 4.0,
        },
    ),
    (
        "baobab",
        SpeciesPreset {
            trunk_height_ratio: 0.6,
            trunk_diameter_ratio: 0.2,
            base_angle: 65.0,
            angle_variation: 20.0,
            radius_decay: 0.6,
            length_decay: 0.65,
            crown_shape: CrownShape::Umbrella,
            max_depth: 5,
            terminal_branches: 3,
            leader_ratio: 0.2,
            tip_curvature: 0.3,
            branches_per_tier: 5.0,
        },
    ),
];

const AGES: &[(&str, AgeModifier)] = &[
    (
        "young",
        AgeModifier {
            trunk_thickness: 0.6,
            branch_density: 0.7,
            irregularity: 0.05,
            depth_adjust: -1,
        },
    ),
    (
        "mature",
        AgeModifier {
            trunk_thickness: 1.0,
            branch_density: 1.0,
            irregularity: 0.15,
            depth_adjust: 0,
        },
    ),
    (
        "old",
        AgeModifier {
            trunk_thickness: 1.3,
            branch_density: 1.1,
            irregularity: 0.3,
            depth_adjust: 0,
        },
    ),
    (
        "ancient",
        AgeModifier {
            trunk_thickness: 1.6,
            branch_density: 0.9,
            irregularity: 0.5,
            depth_adjust: 1,
        },
    ),
];

fn find<'a, T>(table: &'a [(&str, T)], name: &str) -> Option<&'a T> {
    let key = name.trim().to_ascii_lowercase();
    table.iter().find(|(n, _)| *n == key).map(|(_, v)| v)
}

/// Look up a species preset, falling back to [`DEFAULT_SPECIES`].
pub fn lookup_species(name: &str) -> SpeciesPreset {
    match find(SPECIES, name) {
        Some(preset) => *preset,
        None => {
            warn!(species = name, fallback = DEFAULT_SPECIES, "unknown species");
            SPECIES[0].1
        }
    }
}

/// Look up an age modifier, falling back to [`DEFAULT_AGE`].
pub fn lookup_age(name: &str) -> AgeModifier {
    match find(AGES, name) {
        Some(age) => *age,
        None => {
            warn!(age = name, fallback = DEFAULT_AGE, "unknown age category");
            AGES[1].1
        }
    }
}

/// Whether `name` names a known species.
pub fn is_known_species(name: &str) -> bool {
    find(SPECIES, name).is_some()
}

/// All species names in table order.
pub fn species_names() -> impl Iterator<Item = &'static str> {
    SPECIES.iter().map(|(n, _)| *n)
}

/// All age category names in table order.
pub fn age_names() -> impl Iterator<Item = &'static str> {
    AGES.iter().map(|(n, _)| *n)
}

/// Effective recursion depth for a species/age pair, clamped to `1..=15`.
pub fn effective_max_depth(species: &SpeciesPreset, age: &AgeModifier) -> u32 {
    (species.max_depth as i32 + age.depth_adjust).clamp(1, 15) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup_species("Spruce"), lookup_species("spruce"));
        assert_eq!(lookup_age(" OLD "), lookup_age("old"));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(lookup_species("triffid"), lookup_species(DEFAULT_SPECIES));
        assert_eq!(lookup_age("eternal"), lookup_age(DEFAULT_AGE));
        assert!(!is_known_species("triffid"));
    }

    #[test]
    fn test_spruce_is_drooping_conifer() {
        let spruce = lookup_species("spruce");
        assert_eq!(spruce.crown_shape, CrownShape::Pyramidal);
        assert!(spruce.crown_shape.is_conifer());
        assert!(spruce.tip_curvature < 0.0);
        assert!((spruce.leader_ratio - 1.0).abs() < 1e-12);
        assert!((spruce.trunk_height_ratio * 15.0 - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_tables_are_sane() {
        for name in species_names() {
            let s = lookup_species(name);
            assert!(s.radius_decay > 0.0 && s.radius_decay < 1.0, "{name}");
            assert!(s.length_decay > 0.0 && s.length_decay < 1.0, "{name}");
            assert!(s.leader_ratio > 0.0 && s.leader_ratio <= 1.0, "{name}");
            assert!(s.terminal_branches >= 1, "{name}");
        }
        assert_eq!(age_names().count(), 4);
    }

    #[test]
    fn test_effective_depth_is_clamped() {
        let s = lookup_species("oak");
        let mut age = lookup_age("young");
        age.depth_adjust = -100;
        assert_eq!(effective_max_depth(&s, &age), 1);
        age.depth_adjust = 100;
        assert_eq!(effective_max_depth(&s, &age), 15);
    }

    #[test]
    fn test_radial_profiles() {
        assert!(CrownShape::Pyramidal.radial_profile(0.0) > CrownShape::Pyramidal.radial_profile(0.9));
        assert!(CrownShape::Umbrella.radial_profile(0.9) > CrownShape::Umbrella.radial_profile(0.1));
        let mid = CrownShape::Oval.radial_profile(0.5);
        assert!(mid > CrownShape::Oval.radial_profile(0.1));
        assert!(mid > CrownShape::Oval.radial_profile(0.9));
        for shape in [
            CrownShape::Pyramidal,
            CrownShape::Umbrella,
            CrownShape::Dome,
            CrownShape::Oval,
            CrownShape::Spreading,
        ] {
            assert!(shape.radial_profile(1.0) >= 0.12);
        }
    }
}
