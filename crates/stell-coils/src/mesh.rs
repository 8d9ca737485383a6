//! Triangle mesh of finite-build coils
//!
//! Each coil contributes four vertices per station (the cross-section
//! corners, in [`FiniteBuild`] order) and two triangles per side face
//! between consecutive stations. The coil ends are left open.

use serde::Serialize;

use crate::coil::Point;
use crate::frame::FiniteBuild;

/// Vertex/face lists ready for an external renderer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FiniteBuildMesh {
    pub vertices: Vec<Point>,
    pub faces: Vec<[u32; 3]>,
}

impl FiniteBuildMesh {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_vertex(&mut self, position: Point) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(position);
        idx
    }

    fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.faces.push([a, b, c]);
    }

    /// Mesh of a single finite-build coil.
    pub fn from_finite_build(build: &FiniteBuild) -> Self {
        let mut mesh = Self::new();
        let mut stations: Vec<[u32; 4]> = Vec::with_capacity(build.len());
        for i in 0..build.len() {
            let ring = [0, 1, 2, 3].map(|c| mesh.add_vertex(build.corners[c][i]));
            stations.push(ring);
        }

        for pair in stations.windows(2) {
            let (here, next) = (pair[0], pair[1]);
            for side in 0..4 {
                let turn = (side + 1) % 4;
                mesh.add_triangle(here[side], here[turn], next[turn]);
                mesh.add_triangle(here[side], next[turn], next[side]);
            }
        }

        mesh
    }

    /// Append `other`, offsetting its face indices.
    pub fn merge(&mut self, other: &FiniteBuildMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| f.map(|i| i + offset)));
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}
