#![warn(missing_docs)]

//! Printable procedural trees.
//!
//! `arbor` ties the workspace together: [`TreeParams`] describes a tree,
//! a [`Session`] turns it into one watertight mesh with a boolean kernel,
//! and [`AssemblyWorker`] runs sessions off the caller's thread.
//!
//! # Example
//!
//! ```
//! use arbor::{DefaultSession, TreeParams};
//!
//! let mut session = DefaultSession::new();
//! let params = TreeParams {
//!     height: 8.0,
//!     species: "spruce".into(),
//!     max_depth: Some(2),
//!     ..TreeParams::default()
//! };
//! let triangles = session.generate(&params).unwrap().num_triangles();
//!
//! // Print at 1:100.
//! let stl = session.export(Some(arbor::stl::export_scale(100.0))).unwrap();
//! assert_eq!(stl.len(), 84 + 50 * triangles);
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod worker;

pub use arbor_gen as gen;
pub use arbor_kernel as kernel;
pub use arbor_mesh::stl;

pub use arbor_gen::{BranchSegment, ClusterKind, FoliageCluster};
pub use arbor_kernel::{GeneratedMesh, KernelError, SolidKernel};
pub use arbor_mesh::{AssemblyError, AssemblyOptions};
pub use config::{FoliageParams, GeneratorMode, TreeParams};
pub use error::{ArborError, ConfigError, ErrorTag, Result, Stage};
pub use protocol::{Request, Response};
pub use session::Session;
pub use worker::{AssemblyWorker, Pending};

#[cfg(feature = "manifold")]
pub use arbor_kernel::ManifoldKernel;
#[cfg(feature = "manifold")]
pub use session::DefaultSession;
