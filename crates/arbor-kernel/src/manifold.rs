//! `manifold-rs` backed kernel.

use arbor_math::Vec3;
use manifold_rs::Manifold;
use tracing::debug;

use crate::{GeneratedMesh, KernelError, Result, SolidKernel};

/// Kernel backed by the Manifold boolean library.
#[derive(Debug, Default)]
pub struct ManifoldKernel {
    _private: (),
}

impl SolidKernel for ManifoldKernel {
    type Solid = Manifold;

    fn init() -> Result<Self> {
        // A unit cube must come back non-empty, otherwise the native
        // library is unusable.
        if Manifold::cube(1.0, 1.0, 1.0).is_empty() {
            return Err(KernelError::Init(
                "manifold produced an empty unit cube".into(),
            ));
        }
        debug!("manifold kernel ready");
        Ok(Self { _private: () })
    }

    fn name(&self) -> &'static str {
        "manifold"
    }

    fn frustum(&self, r_bottom: f64, r_top: f64, height: f64, segments: u32) -> Manifold {
        Manifold::cylinder(r_bottom, r_top, height, segments)
    }

    fn sphere(&self, radius: f64, segments: u32) -> Manifold {
        Manifold::sphere(radius, segments)
    }

    fn rotate(&self, solid: Manifold, x_deg: f64, y_deg: f64, z_deg: f64) -> Manifold {
        solid.rotate(x_deg, y_deg, z_deg)
    }

    fn translate(&self, solid: Manifold, offset: &Vec3) -> Manifold {
        solid.translate(offset.x, offset.y, offset.z)
    }

    fn union(&self, a: Manifold, b: Manifold) -> Manifold {
        a.union(&b)
    }

    fn is_empty(&self, solid: &Manifold) -> bool {
        solid.is_empty()
    }

    fn to_mesh(&self, solid: &Manifold) -> GeneratedMesh {
        let mesh = solid.to_mesh();
        GeneratedMesh::new(mesh.vertices(), mesh.indices())
    }
}
