//! CSG pipeline: primitives to one unioned mesh.

use std::time::Instant;

use arbor_gen::{BranchSegment, ClusterKind, FoliageCluster};
use arbor_kernel::{GeneratedMesh, SolidKernel};
use arbor_math::{AxisAlignment, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, info_span};

/// Segments shorter than this are not realized.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Errors from [`assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Nothing survived realization, or the union came back empty.
    #[error("no geometry generated")]
    NoGeometry,
}

/// Result alias for assembly.
pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Tessellation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Average radius below which a segment uses `thin_facets`.
    pub thin_radius: f64,
    /// Average radius below which a segment uses `medium_facets`.
    pub medium_radius: f64,
    /// Facets for thin segments.
    pub thin_facets: u32,
    /// Facets for medium segments.
    pub medium_facets: u32,
    /// Facets for everything thicker.
    pub full_facets: u32,
    /// Facets for foliage primitives.
    pub foliage_facets: u32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            thin_radius: 0.1,
            medium_radius: 0.3,
            thin_facets: 6,
            medium_facets: 10,
            full_facets: 16,
            foliage_facets: 16,
        }
    }
}

impl AssemblyOptions {
    /// Facet count for a segment of the given average radius.
    pub fn facets_for(&self, radius: f64) -> u32 {
        if radius < self.thin_radius {
            self.thin_facets
        } else if radius < self.medium_radius {
            self.medium_facets
        } else {
            self.full_facets
        }
    }

    /// Check that the facet counts describe real polygons and the radius
    /// tiers are ordered.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, n) in [
            ("thin_facets", self.thin_facets),
            ("medium_facets", self.medium_facets),
            ("full_facets", self.full_facets),
            ("foliage_facets", self.foliage_facets),
        ] {
            if n < 3 {
                return Err(format!("{name} must be at least 3, got {n}"));
            }
        }
        if self.thin_radius > self.medium_radius {
            return Err("thin_radius must not exceed medium_radius".into());
        }
        Ok(())
    }
}

/// Realize a segment as a tapered cylinder aligned with its axis.
///
/// Returns `None` for zero-length or non-positive-radius segments.
pub fn realize_segment<K: SolidKernel>(
    kernel: &K,
    segment: &BranchSegment,
    options: &AssemblyOptions,
) -> Option<K::Solid> {
    let axis = segment.axis();
    let length = axis.norm();
    if length < MIN_SEGMENT_LENGTH || segment.r1 <= 0.0 || segment.r2 < 0.0 {
        return None;
    }
    let align = AxisAlignment::from_direction(&axis)?;
    let facets = options.facets_for(segment.average_radius());
    let solid = kernel.frustum(segment.r1, segment.r2, length, facets);
    let solid = kernel.rotate(solid, 0.0, align.tilt_deg, align.yaw_deg);
    Some(kernel.translate(solid, &segment.start.coords))
}

/// Realize a foliage cluster, centered on its `center`.
pub fn realize_cluster<K: SolidKernel>(
    kernel: &K,
    cluster: &FoliageCluster,
    options: &AssemblyOptions,
) -> Option<K::Solid> {
    if cluster.radius <= 0.0 {
        return None;
    }
    let facets = options.foliage_facets;
    match cluster.kind {
        ClusterKind::Sphere => {
            let solid = kernel.sphere(cluster.radius, facets);
            Some(kernel.translate(solid, &cluster.center.coords))
        }
        ClusterKind::Cone | ClusterKind::Cylinder => {
            let height = cluster.height.unwrap_or(cluster.radius * 2.0);
            if height < MIN_SEGMENT_LENGTH {
                return None;
            }
            let top = match cluster.kind {
                ClusterKind::Cone => cluster.top_radius.unwrap_or(0.0).max(0.0),
                _ => cluster.radius,
            };
            let solid = kernel.frustum(cluster.radius, top, height, facets);
            let offset = cluster.center.coords - Vec3::new(0.0, 0.0, height * 0.5);
            Some(kernel.translate(solid, &offset))
        }
    }
}

/// Union a list of solids by recursive halving.
///
/// Union depth is `⌈log₂ n⌉`. Each operand is moved into the union that
/// consumes it, so intermediates are released as soon as their parent
/// exists. Returns `None` for an empty list.
pub fn union_tree<K: SolidKernel>(kernel: &K, mut solids: Vec<K::Solid>) -> Option<K::Solid> {
    match solids.len() {
        0 => None,
        1 => solids.pop(),
        n => {
            let right = solids.split_off(n / 2);
            let a = union_tree(kernel, solids)?;
            let b = union_tree(kernel, right)?;
            Some(kernel.union(a, b))
        }
    }
}

/// Realize every segment and cluster, union them, and read out the mesh.
///
/// Fails with [`AssemblyError::NoGeometry`] when nothing is realizable or
/// the union is empty. Never returns a partial mesh.
pub fn assemble<K: SolidKernel>(
    kernel: &K,
    segments: &[BranchSegment],
    clusters: &[FoliageCluster],
    options: &AssemblyOptions,
) -> Result<GeneratedMesh> {
    let _span = info_span!(
        "assemble",
        kernel = kernel.name(),
        segments = segments.len(),
        clusters = clusters.len()
    )
    .entered();
    let started = Instant::now();

    let mut solids = Vec::with_capacity(segments.len() + clusters.len());
    solids.extend(
        segments
            .iter()
            .filter_map(|s| realize_segment(kernel, s, options)),
    );
    solids.extend(
        clusters
            .iter()
            .filter_map(|c| realize_cluster(kernel, c, options)),
    );
    let count = solids.len();
    debug!(
        solids = count,
        skipped = segments.len() + clusters.len() - count,
        "primitives realized"
    );

    let merged = union_tree(kernel, solids).ok_or(AssemblyError::NoGeometry)?;
    if kernel.is_empty(&merged) {
        return Err(AssemblyError::NoGeometry);
    }
    let mesh = kernel.to_mesh(&merged);
    drop(merged);

    info!(
        solids = count,
        triangles = mesh.num_triangles(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "mesh assembled"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_kernel::KernelError;
    use arbor_math::Point3;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Tracks union depth and live solid count.
    #[derive(Default)]
    struct Recorder {
        live: Rc<Cell<usize>>,
        peak: Cell<usize>,
        unions: Cell<usize>,
        frustums: RefCell<Vec<(f64, f64, f64, u32)>>,
        rotations: RefCell<Vec<(f64, f64, f64)>>,
        translations: RefCell<Vec<Vec3>>,
    }

    struct Rec {
        depth: usize,
        leaves: usize,
        live: Rc<Cell<usize>>,
    }

    impl Drop for Rec {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl Recorder {
        fn make(&self, depth: usize, leaves: usize) -> Rec {
            self.live.set(self.live.get() + 1);
            self.peak.set(self.peak.get().max(self.live.get()));
            Rec {
                depth,
                leaves,
                live: Rc::clone(&self.live),
            }
        }
    }

    impl SolidKernel for Recorder {
        type Solid = Rec;

        fn init() -> std::result::Result<Self, KernelError> {
            Ok(Self::default())
        }

        fn name(&self) -> &'static str {
            "recorder"
        }

        fn frustum(&self, r1: f64, r2: f64, h: f64, n: u32) -> Rec {
            self.frustums.borrow_mut().push((r1, r2, h, n));
            self.make(0, 1)
        }

        fn sphere(&self, _radius: f64, _segments: u32) -> Rec {
            self.make(0, 1)
        }

        fn rotate(&self, solid: Rec, x: f64, y: f64, z: f64) -> Rec {
            self.rotations.borrow_mut().push((x, y, z));
            solid
        }

        fn translate(&self, solid: Rec, offset: &Vec3) -> Rec {
            self.translations.borrow_mut().push(*offset);
            solid
        }

        fn union(&self, a: Rec, b: Rec) -> Rec {
            self.unions.set(self.unions.get() + 1);
            let depth = a.depth.max(b.depth) + 1;
            let leaves = a.leaves + b.leaves;
            drop(a);
            drop(b);
            self.make(depth, leaves)
        }

        fn is_empty(&self, solid: &Rec) -> bool {
            solid.leaves == 0
        }

        fn to_mesh(&self, solid: &Rec) -> GeneratedMesh {
            let mut mesh = GeneratedMesh::default();
            for i in 0..solid.leaves {
                let x = i as f32 * 2.0;
                mesh.merge(&GeneratedMesh::cuboid([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0]));
            }
            mesh
        }
    }

    fn seg(start: [f64; 3], end: [f64; 3], r: f64) -> BranchSegment {
        BranchSegment::new(Point3::from(start), Point3::from(end), r, r * 0.85, 1)
    }

    #[test]
    fn test_union_depth_is_logarithmic() {
        for n in 1..=70usize {
            let k = Recorder::init().unwrap();
            let leaves: Vec<Rec> = (0..n).map(|_| k.sphere(1.0, 8)).collect();
            let root = union_tree(&k, leaves).unwrap();
            let expected = (n as f64).log2().ceil() as usize;
            assert_eq!(root.depth, expected, "n = {n}");
            assert_eq!(root.leaves, n);
            assert_eq!(k.unions.get(), n - 1);
            // Only the root is still alive.
            assert_eq!(k.live.get(), 1);
            assert!(k.peak.get() <= n);
        }
    }

    #[test]
    fn test_union_tree_empty() {
        let k = Recorder::init().unwrap();
        assert!(union_tree(&k, Vec::new()).is_none());
    }

    #[test]
    fn test_assemble_releases_everything() {
        let k = Recorder::init().unwrap();
        let segments: Vec<_> = (0..10)
            .map(|i| seg([0.0, 0.0, i as f64], [0.0, 0.0, i as f64 + 1.0], 0.5))
            .collect();
        let clusters = [FoliageCluster::sphere(Point3::new(0.0, 0.0, 12.0), 1.0)];
        let mesh = assemble(&k, &segments, &clusters, &AssemblyOptions::default()).unwrap();
        assert_eq!(mesh.num_triangles(), 11 * 12);
        assert_eq!(k.live.get(), 0);
    }

    #[test]
    fn test_empty_input_is_no_geometry() {
        let k = Recorder::init().unwrap();
        let err = assemble(&k, &[], &[], &AssemblyOptions::default()).unwrap_err();
        assert_eq!(err, AssemblyError::NoGeometry);
        assert_eq!(err.to_string(), "no geometry generated");
    }

    #[test]
    fn test_zero_length_segments_skipped() {
        let k = Recorder::init().unwrap();
        let degenerate = [seg([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], 0.5)];
        let err = assemble(&k, &degenerate, &[], &AssemblyOptions::default()).unwrap_err();
        assert_eq!(err, AssemblyError::NoGeometry);
        assert!(k.frustums.borrow().is_empty());
    }

    #[test]
    fn test_facet_tiers() {
        let k = Recorder::init().unwrap();
        let opts = AssemblyOptions::default();
        for r in [0.05, 0.2, 0.5] {
            realize_segment(&k, &seg([0.0; 3], [0.0, 0.0, 1.0], r / 0.925), &opts);
        }
        let facets: Vec<u32> = k.frustums.borrow().iter().map(|f| f.3).collect();
        assert_eq!(facets, vec![6, 10, 16]);
    }

    #[test]
    fn test_segment_alignment() {
        let k = Recorder::init().unwrap();
        let s = seg([1.0, 2.0, 3.0], [1.0, 5.0, 3.0], 0.2);
        realize_segment(&k, &s, &AssemblyOptions::default()).unwrap();
        let (r1, r2, h, _) = k.frustums.borrow()[0];
        assert_eq!((r1, r2), (s.r1, s.r2));
        assert!((h - 3.0).abs() < 1e-12);
        let (x, tilt, yaw) = k.rotations.borrow()[0];
        assert_eq!(x, 0.0);
        assert!((tilt - 90.0).abs() < 1e-9);
        assert!((yaw - 90.0).abs() < 1e-9);
        assert_eq!(k.translations.borrow()[0], Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_cone_cluster_is_centered() {
        let k = Recorder::init().unwrap();
        let c = FoliageCluster::cone(Point3::new(0.0, 0.0, 10.0), 2.0, 0.5, 4.0);
        realize_cluster(&k, &c, &AssemblyOptions::default()).unwrap();
        assert_eq!(k.frustums.borrow()[0], (2.0, 0.5, 4.0, 16));
        assert_eq!(k.translations.borrow()[0], Vec3::new(0.0, 0.0, 8.0));
    }

    #[test]
    fn test_options_validate() {
        assert!(AssemblyOptions::default().validate().is_ok());
        let bad = AssemblyOptions {
            thin_facets: 2,
            ..AssemblyOptions::default()
        };
        assert!(bad.validate().is_err());
    }
}
