//! Bracketed L-system expansion and 3D turtle interpretation.
//!
//! | symbol | action |
//! |--------|--------|
//! | `F` | move forward, emitting a segment |
//! | `+` `-` | yaw about the local Y axis |
//! | `&` `^` | pitch about the local X axis |
//! | `\` `/` | roll about the local Z axis |
//! | `[` `]` | push / pop turtle state |
//!
//! Anything else is ignored.

use arbor_math::{Point3, Rotation, Vec3};
use nalgebra::Unit;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::species::{effective_max_depth, lookup_age, lookup_species};
use crate::BranchSegment;

/// Fixed turn angle in degrees.
pub const TURN_ANGLE: f64 = 25.0;

/// Fraction of the way the turtle re-orients toward a bent step.
const REORIENT: f64 = 0.5;

/// The production applied to every `F`: `FF` followed by
/// `branching_factor` side branches of alternating sign.
pub fn production(branching_factor: u32) -> String {
    let mut rule = String::from("FF");
    for i in 0..branching_factor {
        rule.push('[');
        rule.push(if i % 2 == 0 { '+' } else { '-' });
        rule.push_str("F]");
    }
    rule
}

/// Rewrite `axiom` `depth` times. Symbols other than `F` pass through.
pub fn expand(axiom: &str, depth: u32, branching_factor: u32) -> String {
    let rule = production(branching_factor);
    let mut current = axiom.to_string();
    for _ in 0..depth {
        let mut next = String::with_capacity(current.len() * rule.len());
        for c in current.chars() {
            if c == 'F' {
                next.push_str(&rule);
            } else {
                next.push(c);
            }
        }
        current = next;
    }
    current
}

/// Turtle settings for [`interpret`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleParams {
    /// Radius of the first segment.
    pub initial_radius: f64,
    /// Length of the first step.
    pub initial_length: f64,
    /// End radius over start radius, per step.
    pub thickness_decay: f64,
    /// Step length multiplier, per step.
    pub length_decay: f64,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Model units to output units.
    pub model_scale: f64,
    /// Pull of each step toward straight down (0 = none).
    pub gravitropism: f64,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            initial_radius: 0.3,
            initial_length: 1.0,
            thickness_decay: 0.8,
            length_decay: 0.9,
            min_radius: 0.03,
            model_scale: 1.0,
            gravitropism: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Turtle {
    position: Point3,
    orientation: Rotation,
    radius: f64,
    length: f64,
}

impl Turtle {
    fn heading(&self) -> Vec3 {
        self.orientation * Vec3::z()
    }

    fn turn(&mut self, axis: Unit<Vec3>, degrees: f64) {
        self.orientation *= Rotation::from_axis_angle(&axis, degrees.to_radians());
    }
}

/// Walk `program` with a turtle starting at the origin heading +Z.
pub fn interpret(program: &str, params: &TurtleParams) -> Vec<BranchSegment> {
    let mut out = Vec::new();
    let mut stack: Vec<Turtle> = Vec::new();
    let mut t = Turtle {
        position: Point3::origin(),
        orientation: Rotation::identity(),
        radius: params.initial_radius,
        length: params.initial_length,
    };
    let down = Vec3::new(0.0, 0.0, -1.0);

    for c in program.chars() {
        match c {
            'F' => {
                let heading = t.heading();
                let bent = heading + down * params.gravitropism;
                let bent = if bent.norm() > 1e-9 {
                    bent.normalize()
                } else {
                    heading
                };
                let next = t.position + bent * t.length;
                let r2 = t.radius * params.thickness_decay;
                if t.radius.min(r2) * params.model_scale >= params.min_radius {
                    out.push(BranchSegment::new(
                        t.position,
                        next,
                        t.radius,
                        r2,
                        stack.len() as u32,
                    ));
                }
                t.position = next;

                if let Some(bend) = Rotation::rotation_between(&heading, &bent) {
                    let target = bend * t.orientation;
                    t.orientation = t
                        .orientation
                        .try_slerp(&target, REORIENT, 1e-9)
                        .unwrap_or(target);
                }
                t.radius = r2;
                t.length *= params.length_decay;
            }
            '+' => t.turn(Vec3::y_axis(), TURN_ANGLE),
            '-' => t.turn(Vec3::y_axis(), -TURN_ANGLE),
            '&' => t.turn(Vec3::x_axis(), TURN_ANGLE),
            '^' => t.turn(Vec3::x_axis(), -TURN_ANGLE),
            '\\' => t.turn(Vec3::z_axis(), TURN_ANGLE),
            '/' => t.turn(Vec3::z_axis(), -TURN_ANGLE),
            '[' => stack.push(t),
            ']' => {
                if let Some(saved) = stack.pop() {
                    t = saved;
                }
            }
            _ => {}
        }
    }
    out
}

/// Species-driven front end over [`expand`] and [`interpret`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LSystemGenerator {
    /// Height spanned by the straight main axis.
    pub height: f64,
    /// Species name; picks depth, branching and trunk thickness.
    pub species: String,
    /// Age category name.
    pub age: String,
    /// Smallest printable radius, in output units.
    pub min_radius: f64,
    /// Model units to output units.
    pub model_scale: f64,
    /// Pull toward straight down.
    pub gravitropism: f64,
}

impl Default for LSystemGenerator {
    fn default() -> Self {
        Self {
            height: 15.0,
            species: "oak".into(),
            age: "mature".into(),
            min_radius: 0.03,
            model_scale: 1.0,
            gravitropism: 0.05,
        }
    }
}

impl LSystemGenerator {
    /// Rewriting depth and branching factor for the configured species.
    pub fn rule_shape(&self) -> (u32, u32) {
        let species = lookup_species(&self.species);
        let age = lookup_age(&self.age);
        let depth = effective_max_depth(&species, &age).saturating_sub(2).clamp(2, 4);
        (depth, species.terminal_branches.clamp(1, 3))
    }

    /// Turtle settings, with the first step sized so the `2^depth` steps of
    /// the main axis sum to `height`.
    pub fn turtle_params(&self) -> TurtleParams {
        let species = lookup_species(&self.species);
        let age = lookup_age(&self.age);
        let (depth, _) = self.rule_shape();
        let length_decay = 0.5 + 0.5 * species.length_decay;
        let steps = 2f64.powi(depth as i32);
        let initial_length = self.height * (1.0 - length_decay) / (1.0 - length_decay.powf(steps));
        TurtleParams {
            initial_radius: self.height * species.trunk_diameter_ratio * 0.5 * age.trunk_thickness,
            initial_length,
            thickness_decay: 0.88,
            length_decay,
            min_radius: self.min_radius,
            model_scale: self.model_scale,
            gravitropism: self.gravitropism,
        }
    }

    /// Expand from `F` and interpret.
    pub fn generate(&self) -> Vec<BranchSegment> {
        let (depth, branching) = self.rule_shape();
        let program = expand("F", depth, branching);
        let segments = interpret(&program, &self.turtle_params());
        debug!(
            depth,
            branching,
            symbols = program.len(),
            segments = segments.len(),
            "l-system skeleton generated"
        );
        segments
    }
}
