//! Indexed triangle mesh buffers

use glam::{Vec2, Vec3};

/// Triangle mesh with per-vertex normals and UVs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Two triangles for a quad given in counter-clockwise order as seen
    /// from the side its normal points to.
    pub fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.push_triangle(a, b, c);
        self.push_triangle(a, c, d);
    }

    /// Geometric normal of triangle `t` (unnormalised winding normal).
    pub fn face_normal(&self, t: usize) -> Vec3 {
        let a = self.positions[self.indices[t * 3] as usize];
        let b = self.positions[self.indices[t * 3 + 1] as usize];
        let c = self.positions[self.indices[t * 3 + 2] as usize];
        (b - a).cross(c - a)
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Axis-aligned box with outward normals, four vertices per face.
    pub fn cuboid(center: Vec3, half: Vec3) -> Self {
        let mut mesh = MeshData::new();
        // (normal, tangent u, tangent v) with u × v == normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        for (normal, u, v) in faces {
            let face_center = center + normal * half;
            let du = u * half;
            let dv = v * half;
            let a = mesh.push_vertex(face_center - du - dv, normal, Vec2::new(0.0, 0.0));
            let b = mesh.push_vertex(face_center + du - dv, normal, Vec2::new(1.0, 0.0));
            let c = mesh.push_vertex(face_center + du + dv, normal, Vec2::new(1.0, 1.0));
            let d = mesh.push_vertex(face_center - du + dv, normal, Vec2::new(0.0, 1.0));
            mesh.push_quad(a, b, c, d);
        }
        mesh
    }
}
