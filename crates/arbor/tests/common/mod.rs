//! Test kernels.

#![allow(dead_code)]

use std::sync::{Condvar, Mutex};

use arbor::{GeneratedMesh, KernelError, SolidKernel};
use arbor_math::{euler_xyz_deg, Point3, Vec3};

/// Axis-aligned box with `min`/`max` corners.
pub type Cell = (Point3, Point3);

/// Kernel whose solids are lists of bounding boxes. Fast, deterministic and
/// good enough for pipeline tests that do not need real booleans.
#[derive(Debug, Default)]
pub struct BoxKernel;

fn cell(min: [f64; 3], max: [f64; 3]) -> Cell {
    (Point3::from(min), Point3::from(max))
}

fn boxes_to_mesh(cells: &[Cell]) -> GeneratedMesh {
    let mut mesh = GeneratedMesh::default();
    for (lo, hi) in cells {
        mesh.merge(&GeneratedMesh::cuboid(
            [lo.x as f32, lo.y as f32, lo.z as f32],
            [hi.x as f32, hi.y as f32, hi.z as f32],
        ));
    }
    mesh
}

impl SolidKernel for BoxKernel {
    type Solid = Vec<Cell>;

    fn init() -> arbor_kernel::Result<Self> {
        Ok(BoxKernel)
    }

    fn name(&self) -> &'static str {
        "box"
    }

    fn frustum(&self, r_bottom: f64, r_top: f64, height: f64, _segments: u32) -> Self::Solid {
        let r = r_bottom.max(r_top);
        vec![cell([-r, -r, 0.0], [r, r, height])]
    }

    fn sphere(&self, radius: f64, _segments: u32) -> Self::Solid {
        let r = radius;
        vec![cell([-r, -r, -r], [r, r, r])]
    }

    fn rotate(&self, solid: Self::Solid, x_deg: f64, y_deg: f64, z_deg: f64) -> Self::Solid {
        let r = euler_xyz_deg(x_deg, y_deg, z_deg);
        solid
            .into_iter()
            .map(|(lo, hi)| {
                let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
                let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
                for i in 0..8 {
                    let corner = Point3::new(
                        if i & 1 == 0 { lo.x } else { hi.x },
                        if i & 2 == 0 { lo.y } else { hi.y },
                        if i & 4 == 0 { lo.z } else { hi.z },
                    );
                    let p = r * corner;
                    min = min.inf(&p);
                    max = max.sup(&p);
                }
                (min, max)
            })
            .collect()
    }

    fn translate(&self, solid: Self::Solid, offset: &Vec3) -> Self::Solid {
        solid
            .into_iter()
            .map(|(lo, hi)| (lo + *offset, hi + *offset))
            .collect()
    }

    fn union(&self, mut a: Self::Solid, b: Self::Solid) -> Self::Solid {
        a.extend(b);
        a
    }

    fn is_empty(&self, solid: &Self::Solid) -> bool {
        solid.is_empty()
    }

    fn to_mesh(&self, solid: &Self::Solid) -> GeneratedMesh {
        boxes_to_mesh(solid)
    }
}

/// Kernel that never starts.
#[derive(Debug)]
pub struct FailingKernel;

impl SolidKernel for FailingKernel {
    type Solid = ();

    fn init() -> arbor_kernel::Result<Self> {
        Err(KernelError::Init("native library missing".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }

    fn frustum(&self, _: f64, _: f64, _: f64, _: u32) -> Self::Solid {}

    fn sphere(&self, _: f64, _: u32) -> Self::Solid {}

    fn rotate(&self, _: Self::Solid, _: f64, _: f64, _: f64) -> Self::Solid {}

    fn translate(&self, _: Self::Solid, _: &Vec3) -> Self::Solid {}

    fn union(&self, _: Self::Solid, _: Self::Solid) -> Self::Solid {}

    fn is_empty(&self, _: &()) -> bool {
        true
    }

    fn to_mesh(&self, _: &()) -> GeneratedMesh {
        GeneratedMesh::default()
    }
}

/// Gate that holds [`GatedKernel::to_mesh`] until opened.
pub struct Gate {
    state: Mutex<GateState>,
    cv: Condvar,
}

struct GateState {
    entered: usize,
    open: bool,
}

impl Gate {
    const fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                entered: 0,
                open: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Block until at least `n` calls are waiting at the gate.
    pub fn wait_entered(&self, n: usize) {
        let mut s = self.state.lock().unwrap();
        while s.entered < n {
            s = self.cv.wait(s).unwrap();
        }
    }

    /// Let every waiting and future call through.
    pub fn open(&self) {
        self.state.lock().unwrap().open = true;
        self.cv.notify_all();
    }

    /// Number of calls that reached the gate.
    pub fn entered(&self) -> usize {
        self.state.lock().unwrap().entered
    }

    fn pass(&self) {
        let mut s = self.state.lock().unwrap();
        s.entered += 1;
        self.cv.notify_all();
        while !s.open {
            s = self.cv.wait(s).unwrap();
        }
    }
}

/// Gate used by [`GatedKernel`]. Only one test may use it.
pub static GATE: Gate = Gate::new();

/// [`BoxKernel`] whose mesh read-out waits on [`GATE`].
#[derive(Debug, Default)]
pub struct GatedKernel(BoxKernel);

impl SolidKernel for GatedKernel {
    type Solid = Vec<Cell>;

    fn init() -> arbor_kernel::Result<Self> {
        Ok(GatedKernel(BoxKernel))
    }

    fn name(&self) -> &'static str {
        "gated"
    }

    fn frustum(&self, r_bottom: f64, r_top: f64, height: f64, segments: u32) -> Self::Solid {
        self.0.frustum(r_bottom, r_top, height, segments)
    }

    fn sphere(&self, radius: f64, segments: u32) -> Self::Solid {
        self.0.sphere(radius, segments)
    }

    fn rotate(&self, solid: Self::Solid, x: f64, y: f64, z: f64) -> Self::Solid {
        self.0.rotate(solid, x, y, z)
    }

    fn translate(&self, solid: Self::Solid, offset: &Vec3) -> Self::Solid {
        self.0.translate(solid, offset)
    }

    fn union(&self, a: Self::Solid, b: Self::Solid) -> Self::Solid {
        self.0.union(a, b)
    }

    fn is_empty(&self, solid: &Self::Solid) -> bool {
        self.0.is_empty(solid)
    }

    fn to_mesh(&self, solid: &Self::Solid) -> GeneratedMesh {
        GATE.pass();
        self.0.to_mesh(solid)
    }
}
