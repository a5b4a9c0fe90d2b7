//! Binary STL export.
//!
//! Layout (all little-endian):
//!
//! | bytes | content |
//! |-------|---------|
//! | 80 | header |
//! | 4 | triangle count (`u32`) |
//! | 50 × N | normal (3 × `f32`), three vertices (9 × `f32`), attribute (`u16`, zero) |

use std::fs;
use std::io;
use std::path::Path;

use arbor_kernel::GeneratedMesh;
use arbor_math::Vec3;

/// Header length in bytes.
pub const HEADER_LEN: usize = 80;

/// Bytes per triangle record.
pub const RECORD_LEN: usize = 50;

const HEADER_TEXT: &[u8] = b"arbor binary STL";

fn header() -> [u8; HEADER_LEN] {
    let mut h = [b' '; HEADER_LEN];
    h[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    h
}

/// Exact encoded size for `triangles` triangles.
pub fn encoded_len(triangles: usize) -> usize {
    HEADER_LEN + 4 + RECORD_LEN * triangles
}

/// Encode `mesh` as binary STL.
///
/// `scale` multiplies vertex positions only, immediately before writing.
/// A degenerate triangle gets a zero normal.
pub fn to_stl_bytes(mesh: &GeneratedMesh, scale: Option<f64>) -> Vec<u8> {
    let factor = scale.unwrap_or(1.0);
    let num_triangles = mesh.num_triangles();
    let mut data = Vec::with_capacity(encoded_len(num_triangles));

    data.extend_from_slice(&header());
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.triangles() {
        let [v0, v1, v2] = tri.map(|p| p * factor);
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        let n = if len > 1e-12 { n / len } else { Vec3::zeros() };

        for c in [n.x, n.y, n.z] {
            data.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for v in [v0, v1, v2] {
            data.extend_from_slice(&(v.x as f32).to_le_bytes());
            data.extend_from_slice(&(v.y as f32).to_le_bytes());
            data.extend_from_slice(&(v.z as f32).to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    data
}

/// Triangle count stored at byte offset 80, or `None` if `bytes` is too
/// short to hold a header.
pub fn triangle_count(bytes: &[u8]) -> Option<u32> {
    let field = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes(field.try_into().ok()?))
}

/// Encode and write to `path`.
pub fn write_stl(
    path: impl AsRef<Path>,
    mesh: &GeneratedMesh,
    scale: Option<f64>,
) -> io::Result<()> {
    fs::write(path, to_stl_bytes(mesh, scale))
}

/// Uniform scale for a `1 : ratio_denominator` print.
pub fn export_scale(ratio_denominator: f64) -> f64 {
    1.0 / ratio_denominator
}

/// Printed height of a `height`-tall model at `1 : ratio_denominator`.
///
/// A 15-unit tree at 1:200 prints 0.075 units tall.
pub fn printed_height(height: f64, ratio_denominator: f64) -> f64 {
    height * export_scale(ratio_denominator)
}
