//! Owning context for one kernel and its last mesh.

use std::time::Instant;

use arbor_kernel::{GeneratedMesh, KernelError, SolidKernel};
use arbor_mesh::{assemble, stl};
use tracing::{debug, error, info, info_span};

use crate::config::TreeParams;
use crate::error::{ArborError, Result};
use crate::protocol::{Request, Response};

/// A kernel plus the most recent generation result.
///
/// Kernel start-up failure is reported once through `tracing::error!` and
/// then poisons the session: every request fails with the same
/// [`ArborError::KernelInit`] until [`Session::reinitialize`] succeeds.
pub struct Session<K: SolidKernel> {
    kernel: Option<K>,
    init_error: Option<KernelError>,
    mesh: Option<GeneratedMesh>,
    params: Option<TreeParams>,
}

impl<K: SolidKernel> Session<K> {
    /// Bring up a kernel and wrap it.
    pub fn new() -> Self {
        let mut session = Self {
            kernel: None,
            init_error: None,
            mesh: None,
            params: None,
        };
        session.start_kernel();
        session
    }

    /// Wrap an already initialized kernel.
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel: Some(kernel),
            init_error: None,
            mesh: None,
            params: None,
        }
    }

    fn start_kernel(&mut self) {
        match K::init() {
            Ok(kernel) => {
                debug!(kernel = kernel.name(), "kernel ready");
                self.kernel = Some(kernel);
                self.init_error = None;
            }
            Err(e) => {
                error!(error = %e, "kernel initialization failed");
                self.kernel = None;
                self.init_error = Some(e);
            }
        }
    }

    /// Retry kernel start-up, dropping any previous mesh.
    pub fn reinitialize(&mut self) -> Result<()> {
        self.clear();
        self.kernel = None;
        self.start_kernel();
        self.kernel_ref().map(|_| ())
    }

    /// Whether the kernel is up.
    pub fn is_ready(&self) -> bool {
        self.kernel.is_some()
    }

    fn kernel_ref(&self) -> Result<&K> {
        match (&self.kernel, &self.init_error) {
            (Some(k), _) => Ok(k),
            (None, Some(e)) => Err(e.clone().into()),
            (None, None) => Err(KernelError::Init("kernel not started".into()).into()),
        }
    }

    /// Generate a tree and keep its mesh as the current result.
    ///
    /// The previous mesh is dropped first, so a failure leaves no mesh.
    pub fn generate(&mut self, params: &TreeParams) -> Result<&GeneratedMesh> {
        self.clear();
        let kernel = self.kernel_ref()?;
        params.validate()?;

        let _span = info_span!(
            "generate",
            mode = ?params.mode,
            species = %params.species,
            seed = params.seed
        )
        .entered();
        let started = Instant::now();

        let segments = params.skeleton();
        let clusters = params
            .foliage()
            .map(|f| f.clusters)
            .unwrap_or_default();
        debug!(
            segments = segments.len(),
            clusters = clusters.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "skeleton generated"
        );

        let mesh = assemble(kernel, &segments, &clusters, &params.assembly)?;
        info!(
            triangles = mesh.num_triangles(),
            volume = mesh.volume(),
            surface_area = mesh.surface_area(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tree generated"
        );

        self.params = Some(params.clone());
        Ok(&*self.mesh.insert(mesh))
    }

    /// Encode the current mesh as binary STL.
    ///
    /// `scale` falls back to the last parameters' `export_scale`.
    pub fn export(&self, scale: Option<f64>) -> Result<Vec<u8>> {
        self.kernel_ref()?;
        let mesh = self.mesh.as_ref().ok_or(ArborError::NoMesh)?;
        let scale = scale.or_else(|| self.params.as_ref().and_then(|p| p.export_scale));
        Ok(stl::to_stl_bytes(mesh, scale))
    }

    /// Encode the current mesh and write it to `path`.
    pub fn export_to(&self, path: impl AsRef<std::path::Path>, scale: Option<f64>) -> Result<()> {
        let bytes = self.export(scale)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Current mesh, if the last generation succeeded.
    pub fn mesh(&self) -> Option<&GeneratedMesh> {
        self.mesh.as_ref()
    }

    /// Parameters of the current mesh.
    pub fn params(&self) -> Option<&TreeParams> {
        self.params.as_ref()
    }

    /// Drop the current mesh.
    pub fn clear(&mut self) {
        self.mesh = None;
        self.params = None;
    }

    /// Answer one protocol request.
    pub fn handle(&mut self, request: Request) -> Response {
        let result = match request {
            Request::Generate(params) => self.generate(&params).map(|mesh| Response::Mesh {
                vertices: mesh.vertices.clone(),
                indices: mesh.indices.clone(),
            }),
            Request::Export { scale } => self.export(scale).map(|bytes| Response::Exported { bytes }),
        };
        result.unwrap_or_else(|e| Response::from_error(&e))
    }
}

impl<K: SolidKernel> Default for Session<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Session over the manifold-backed kernel.
#[cfg(feature = "manifold")]
pub type DefaultSession = Session<arbor_kernel::ManifoldKernel>;
