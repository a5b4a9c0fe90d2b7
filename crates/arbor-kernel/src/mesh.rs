//! Owned triangle mesh snapshot.

use arbor_math::{Aabb3, Point3};
use serde::{Deserialize, Serialize};

/// Vertex positions plus triangle indices, read out of a solid once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl GeneratedMesh {
    /// Wrap raw buffers.
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True when there are no triangles.
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: u32) -> Point3 {
        let i = i as usize * 3;
        Point3::new(
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        )
    }

    /// Corner positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.vertex(t[0]), self.vertex(t[1]), self.vertex(t[2])])
    }

    /// Enclosed volume (divergence theorem). Positive for closed meshes.
    pub fn volume(&self) -> f64 {
        let vol: f64 = self
            .triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum();
        (vol / 6.0).abs()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() / 2.0)
            .sum()
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<Aabb3> {
        if self.vertices.len() < 3 {
            return None;
        }
        let mut b = Aabb3::empty();
        for i in 0..self.num_vertices() {
            b.include_point(&self.vertex(i as u32));
        }
        Some(b)
    }

    /// Append another mesh, re-basing its indices.
    pub fn merge(&mut self, other: &GeneratedMesh) {
        let base = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Axis-aligned unit-free box mesh with corners `min` and `max`.
    ///
    /// Outward-facing winding. Handy for tests and placeholders.
    pub fn cuboid(min: [f32; 3], max: [f32; 3]) -> Self {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let vertices = vec![
            x0, y0, z0, x1, y0, z0, x1, y1, z0, x0, y1, z0, //
            x0, y0, z1, x1, y0, z1, x1, y1, z1, x0, y1, z1,
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            1, 2, 6, 1, 6, 5, // right
            2, 3, 7, 2, 7, 6, // back
            3, 0, 4, 3, 4, 7, // left
        ];
        Self { vertices, indices }
    }
}
