//! Tree parameters: the full input to one generation request.
//!
//! Loadable from TOML or JSON. Every field has a default, so a config file
//! only needs the values it changes:
//!
//! ```toml
//! height = 12.0
//! species = "spruce"
//! mode = "realistic"
//!
//! [foliage]
//! style = "conical"
//! density = 0.8
//! ```

use std::path::Path;

use arbor_gen::attractor::{self, AttractorParams};
use arbor_gen::connected::{self, ConnectedParams};
use arbor_gen::foliage::{self, Archetype, FoliageResult, FoliageStyle};
use arbor_gen::lsystem::LSystemGenerator;
use arbor_gen::organic::{self, OrganicParams};
use arbor_gen::realistic::{self, RealisticParams};
use arbor_gen::BranchSegment;
use arbor_mesh::AssemblyOptions;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which branch generator builds the skeleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    /// Envelope-constrained recursive branching.
    #[default]
    Realistic,
    /// Bracketed L-system.
    #[serde(rename = "lsystem", alias = "l-system")]
    LSystem,
    /// Free growth with decorative rings.
    Organic,
    /// Growth that always roots at existing end points, with short loops.
    Connected,
    /// Lorenz attractor curve.
    Abstract,
}

/// Optional foliage settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageParams {
    /// Layout archetype. Defaults to the species' crown shape.
    pub style: Option<Archetype>,
    /// Cluster count control in `0..=1`.
    pub density: f64,
    /// Cluster radius multiplier.
    pub size: f64,
}

impl Default for FoliageParams {
    fn default() -> Self {
        Self {
            style: None,
            density: 0.6,
            size: 1.0,
        }
    }
}

/// Full parameter set for one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Total height in model units.
    pub height: f64,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Random seed.
    pub seed: u64,
    /// Species name. Unknown names fall back to oak.
    pub species: String,
    /// Age category. Unknown names fall back to mature.
    pub age: String,
    /// Crown width multiplier.
    pub crown_width: f64,
    /// Trunk height ratio override.
    pub trunk_height: Option<f64>,
    /// Crown density multiplier.
    pub crown_density: Option<f64>,
    /// Model units to output units.
    pub model_scale: f64,
    /// Default uniform scale applied on export.
    pub export_scale: Option<f64>,
    /// Skeleton strategy.
    pub mode: GeneratorMode,
    /// Recursion depth override for the realistic generator.
    pub max_depth: Option<u32>,
    /// Segment cap for the realistic generator.
    pub segment_budget: usize,
    /// Growth iterations for the organic and connected generators.
    pub branch_count: usize,
    /// Rings added by the organic generator.
    pub loop_count: usize,
    /// Downward pull for the L-system turtle.
    pub gravitropism: f64,
    /// Foliage clusters; none when absent.
    pub foliage: Option<FoliageParams>,
    /// Tessellation settings.
    pub assembly: AssemblyOptions,
}

impl Default for TreeParams {
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
            export_scale: None,
            mode: GeneratorMode::Realistic,
            max_depth: None,
            segment_budget: realistic::DEFAULT_SEGMENT_BUDGET,
            branch_count: 40,
            loop_count: 4,
            gravitropism: 0.05,
            foliage: None,
            assembly: AssemblyOptions::default(),
        }
    }
}

impl TreeParams {
    /// Parse from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a `.toml` or `.json` file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let params = match ext.as_str() {
            "toml" => Self::from_toml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject out-of-range values. Unknown species and age names are not
    /// errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(x: f64) -> bool {
            x.is_finite() && x > 0.0
        }
        fn non_negative(x: f64) -> bool {
            x.is_finite() && x >= 0.0
        }
        fn invalid(msg: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.into()))
        }

        if !positive(self.height) {
            return invalid("height must be positive");
        }
        if !positive(self.min_radius) {
            return invalid("min_radius must be positive");
        }
        if !positive(self.crown_width) {
            return invalid("crown_width must be positive");
        }
        if !positive(self.model_scale) {
            return invalid("model_scale must be positive");
        }
        if self.segment_budget == 0 {
            return invalid("segment_budget must be at least 1");
        }
        if let Some(t) = self.trunk_height {
            if !(0.0..=0.95).contains(&t) {
                return invalid("trunk_height must be between 0 and 0.95");
            }
        }
        if self.crown_density.is_some_and(|d| !non_negative(d)) {
            return invalid("crown_density must not be negative");
        }
        if self.export_scale.is_some_and(|s| !positive(s)) {
            return invalid("export_scale must be positive");
        }
        if let Some(f) = &self.foliage {
            if !(0.0..=1.0).contains(&f.density) {
                return invalid("foliage density must be between 0 and 1");
            }
            if !positive(f.size) {
                return invalid("foliage size must be positive");
            }
        }
        self.assembly.validate().map_err(ConfigError::Invalid)
    }

    /// Parameters for the realistic generator.
    pub fn realistic(&self) -> RealisticParams {
        RealisticParams {
            height: self.height,
            min_radius: self.min_radius,
            seed: self.seed,
            species: self.species.clone(),
            age: self.age.clone(),
            crown_width: self.crown_width,
            trunk_height: self.trunk_height,
            crown_density: self.crown_density,
            model_scale: self.model_scale,
            max_depth: self.max_depth,
            segment_budget: self.segment_budget,
        }
    }

    /// Build the branch skeleton for the configured mode.
    pub fn skeleton(&self) -> Vec<BranchSegment> {
        match self.mode {
            GeneratorMode::Realistic => realistic::generate(&self.realistic()),
            GeneratorMode::LSystem => LSystemGenerator {
                height: self.height,
                species: self.species.clone(),
                age: self.age.clone(),
                min_radius: self.min_radius,
                model_scale: self.model_scale,
                gravitropism: self.gravitropism,
            }
            .generate(),
            GeneratorMode::Organic => organic::generate(&OrganicParams {
                height: self.height,
                min_radius: self.min_radius,
                model_scale: self.model_scale,
                seed: self.seed,
                branch_count: self.branch_count,
                loop_count: self.loop_count,
                ..OrganicParams::default()
            }),
            GeneratorMode::Connected => connected::generate(&ConnectedParams {
                height: self.height,
                min_radius: self.min_radius,
                model_scale: self.model_scale,
                seed: self.seed,
                branch_count: self.branch_count,
                ..ConnectedParams::default()
            }),
            GeneratorMode::Abstract => attractor::generate(&AttractorParams {
                height: self.height,
                min_radius: self.min_radius,
                model_scale: self.model_scale,
                seed: self.seed,
                ..AttractorParams::default()
            }),
        }
    }

    /// Foliage style derived from the species, trunk override and foliage
    /// settings. `None` when foliage is off.
    pub fn foliage_style(&self) -> Option<FoliageStyle> {
        let f = self.foliage.as_ref()?;
        let mut style = FoliageStyle::for_species(&self.species);
        if let Some(archetype) = f.style {
            style.archetype = archetype;
        }
        if let Some(ratio) = self.trunk_height {
            style.crown_width_ratio *= (1.0 - ratio) / (1.0 - style.crown_base_ratio).max(0.05);
            style.crown_base_ratio = ratio;
        }
        style.crown_width_ratio *= self.crown_width;
        style.density = f.density;
        style.size = f.size;
        Some(style)
    }

    /// Lay out foliage, if enabled.
    pub fn foliage(&self) -> Option<FoliageResult> {
        self.foliage_style()
            .map(|style| foliage::generate(self.height, &style, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        TreeParams::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml() {
        let p = TreeParams::from_toml_str(
            r#"
            height = 12.0
            species = "spruce"
            mode = "lsystem"

            [foliage]
            style = "conical"
            density = 0.8

            [assembly]
            full_facets = 24
            "#,
        )
        .unwrap();
        assert_eq!(p.height, 12.0);
        assert_eq!(p.mode, GeneratorMode::LSystem);
        assert_eq!(p.seed, 42);
        let f = p.foliage.unwrap();
        assert_eq!(f.style, Some(Archetype::Conical));
        assert_eq!(f.size, 1.0);
        assert_eq!(p.assembly.full_facets, 24);
        assert_eq!(p.assembly.thin_facets, 6);
    }

    #[test]
    fn test_toml_round_trip() {
        let p = TreeParams {
            species: "willow".into(),
            trunk_height: Some(0.2),
            foliage: Some(FoliageParams::default()),
            mode: GeneratorMode::Connected,
            ..TreeParams::default()
        };
        let text = p.to_toml_string().unwrap();
        assert_eq!(TreeParams::from_toml_str(&text).unwrap(), p);
    }

    #[test]
    fn test_json() {
        let p = TreeParams::from_json_str(r#"{"height": 9, "mode": "abstract"}"#).unwrap();
        assert_eq!(p.height, 9.0);
        assert_eq!(p.mode, GeneratorMode::Abstract);
        assert!(TreeParams::from_json_str("{").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        for p in [
            TreeParams {
                height: 0.0,
                ..TreeParams::default()
            },
            TreeParams {
                min_radius: -1.0,
                ..TreeParams::default()
            },
            TreeParams {
                min_radius: 0.0,
                max_depth: Some(15),
                ..TreeParams::default()
            },
            TreeParams {
                trunk_height: Some(1.5),
                ..TreeParams::default()
            },
            TreeParams {
                segment_budget: 0,
                ..TreeParams::default()
            },
            TreeParams {
                foliage: Some(FoliageParams {
                    density: 2.0,
                    ..FoliageParams::default()
                }),
                ..TreeParams::default()
            },
        ] {
            assert!(matches!(p.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_unknown_names_are_not_errors() {
        let p = TreeParams {
            species: "triffid".into(),
            age: "eternal".into(),
            ..TreeParams::default()
        };
        p.validate().unwrap();
        let oak = TreeParams::default();
        assert_eq!(p.skeleton(), oak.skeleton());
    }

    #[test]
    fn test_every_mode_builds_a_skeleton() {
        for mode in [
            GeneratorMode::Realistic,
            GeneratorMode::LSystem,
            GeneratorMode::Organic,
            GeneratorMode::Connected,
            GeneratorMode::Abstract,
        ] {
            let p = TreeParams {
                mode,
                ..TreeParams::default()
            };
            assert!(!p.skeleton().is_empty(), "{mode:?}");
        }
    }

    #[test]
    fn test_foliage_follows_species() {
        let p = TreeParams {
            species: "spruce".into(),
            foliage: Some(FoliageParams::default()),
            ..TreeParams::default()
        };
        let style = p.foliage_style().unwrap();
        assert_eq!(style.archetype, Archetype::Conical);
        assert!(!p.foliage().unwrap().clusters.is_empty());
        assert!(TreeParams::default().foliage().is_none());
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join(format!("arbor-cfg-{}.toml", std::process::id()));
        std::fs::write(&path, "height = 4.5\nspecies = \"birch\"\n").unwrap();
        let p = TreeParams::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(p.height, 4.5);
        assert_eq!(p.species, "birch");
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let path = std::env::temp_dir().join(format!("arbor-cfg-{}.yaml", std::process::id()));
        std::fs::write(&path, "height: 3").unwrap();
        let err = TreeParams::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
