#![warn(missing_docs)]

//! Mesh assembly and export for arbor.
//!
//! [`assembly`] turns branch segments and foliage clusters into kernel
//! solids and merges them with a balanced union tree. [`stl`] writes the
//! resulting [`GeneratedMesh`] as binary STL.
//!
//! # Example
//!
//! ```
//! use arbor_gen::realistic::{self, RealisticParams};
//! use arbor_kernel::{ManifoldKernel, SolidKernel};
//! use arbor_mesh::{assemble, stl, AssemblyOptions};
//!
//! let kernel = ManifoldKernel::init().unwrap();
//! let params = RealisticParams { height: 6.0, max_depth: Some(2), ..Default::default() };
//! let segments = realistic::generate(&params);
//! let mesh = assemble(&kernel, &segments, &[], &AssemblyOptions::default()).unwrap();
//! let bytes = stl::to_stl_bytes(&mesh, None);
//! assert_eq!(bytes.len(), 84 + 50 * mesh.num_triangles());
//! ```

pub mod assembly;
pub mod stl;

pub use arbor_kernel::GeneratedMesh;
pub use assembly::{assemble, union_tree, AssemblyError, AssemblyOptions};
