//! Platform slabs with organically eroded edges
//!
//! The collider is always the plain box; only the visual mesh is perturbed.
//! Perturbation is weighted by an edge factor that is zero at the center of
//! the footprint and one on its border, so the walkable interior stays flat.

use glam::{Vec2, Vec3};

use crate::arena::types::PartitionTree;
use crate::config::PlatformSettings;
use crate::geometry::mesh::MeshData;
use crate::geometry::{BoundKind, Collider, GeometryBound, GeometryNode, NodeRole, Rect};
use crate::scale::ArenaScale;
use crate::seeds::ArenaRng;

/// z displacement is damped relative to x so edges don't stretch uniformly
const Z_DAMPING: f32 = 0.8;

/// Offset between the two noise channels
const CHANNEL_OFFSET: Vec2 = Vec2::new(57.31, -91.17);

/// Inputs of one slab
#[derive(Clone, Copy, Debug)]
pub struct SlabSpec {
    pub rect: Rect,
    pub top: f32,
    pub thickness: f32,
    /// Maximum horizontal displacement at the border (0 = flat box)
    pub strength: f32,
    pub frequency: f32,
    pub subdivisions: usize,
    /// Per-slab noise offset, see [`noise_offset`]
    pub noise_offset: Vec2,
}

/// A built slab: visual mesh, box collider and the registered bound
#[derive(Clone, Debug)]
pub struct Slab {
    pub mesh: MeshData,
    pub collider: Collider,
    pub bound: GeometryBound,
}

/// 0 at the footprint center, 1 along its border.
pub fn edge_factor(u: f32, v: f32) -> f32 {
    1.0 - (1.0 - (u - 0.5).abs() * 2.0) * (1.0 - (v - 0.5).abs() * 2.0)
}

/// Noise-space offset unique to a slab position and index.
pub fn noise_offset(position: Vec2, index: usize) -> Vec2 {
    Vec2::new(
        position.x * 0.137 + index as f32 * 31.7,
        position.y * 0.137 + index as f32 * 17.3,
    )
}

/// Build a noise-perturbed slab.
pub fn build_slab(spec: &SlabSpec, kind: BoundKind, rng: &ArenaRng) -> Slab {
    let s = spec.subdivisions.max(1);
    let n = s + 1;
    let top = spec.top;
    let bottom = spec.top - spec.thickness;

    // Displaced footprint grid, row-major with i along x (u) and j along z (v)
    let mut grid = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let u = i as f32 / s as f32;
            let v = j as f32 / s as f32;
            let p = spec.rect.point_at(u, v);
            grid.push(p + displacement(spec, p, edge_factor(u, v), rng));
        }
    }
    let at = |i: usize, j: usize| grid[j * n + i];

    let mut mesh = MeshData::new();

    // Top face
    let top_base = mesh.vertex_count() as u32;
    for j in 0..n {
        for i in 0..n {
            let p = at(i, j);
            mesh.push_vertex(
                Vec3::new(p.x, top, p.y),
                Vec3::Y,
                Vec2::new(i as f32 / s as f32, j as f32 / s as f32),
            );
        }
    }
    // Bottom face
    let bottom_base = mesh.vertex_count() as u32;
    for j in 0..n {
        for i in 0..n {
            let p = at(i, j);
            mesh.push_vertex(
                Vec3::new(p.x, bottom, p.y),
                Vec3::NEG_Y,
                Vec2::new(i as f32 / s as f32, j as f32 / s as f32),
            );
        }
    }
    let index = |base: u32, i: usize, j: usize| base + (j * n + i) as u32;
    for j in 0..s {
        for i in 0..s {
            mesh.push_quad(
                index(top_base, i, j),
                index(top_base, i, j + 1),
                index(top_base, i + 1, j + 1),
                index(top_base, i + 1, j),
            );
            mesh.push_quad(
                index(bottom_base, i, j),
                index(bottom_base, i + 1, j),
                index(bottom_base, i + 1, j + 1),
                index(bottom_base, i, j + 1),
            );
        }
    }

    // Sides: walk the border counter-clockwise in the xz plane and stitch
    // the top ring to the bottom ring
    let ring = border_ring(s);
    let ring_len = ring.len();
    for k in 0..ring_len {
        let (i0, j0) = ring[k];
        let (i1, j1) = ring[(k + 1) % ring_len];
        let p0 = at(i0, j0);
        let p1 = at(i1, j1);
        let edge = p1 - p0;
        let normal = Vec3::new(edge.y, 0.0, -edge.x).normalize_or_zero();
        let u0 = k as f32 / ring_len as f32;
        let u1 = (k + 1) as f32 / ring_len as f32;

        let t0 = mesh.push_vertex(Vec3::new(p0.x, top, p0.y), normal, Vec2::new(u0, 0.0));
        let t1 = mesh.push_vertex(Vec3::new(p1.x, top, p1.y), normal, Vec2::new(u1, 0.0));
        let b1 = mesh.push_vertex(Vec3::new(p1.x, bottom, p1.y), normal, Vec2::new(u1, 1.0));
        let b0 = mesh.push_vertex(Vec3::new(p0.x, bottom, p0.y), normal, Vec2::new(u0, 1.0));
        mesh.push_quad(t0, t1, b1, b0);
    }

    let bound = GeometryBound::from_rect(&spec.rect, bottom, top, kind);
    Slab {
        mesh,
        collider: Collider::box_from_bound(&bound),
        bound,
    }
}

fn displacement(spec: &SlabSpec, p: Vec2, edge: f32, rng: &ArenaRng) -> Vec2 {
    if spec.strength <= 0.0 || edge <= 0.0 {
        return Vec2::ZERO;
    }
    let q = spec.noise_offset + p * spec.frequency;
    let r = q + CHANNEL_OFFSET;
    Vec2::new(
        rng.noise2(q.x, q.y) * spec.strength * edge,
        rng.noise2(r.x, r.y) * spec.strength * edge * Z_DAMPING,
    )
}

/// Grid coordinates of the border, counter-clockwise in the xz plane.
fn border_ring(s: usize) -> Vec<(usize, usize)> {
    let mut ring = Vec::with_capacity(4 * s);
    ring.extend((0..s).map(|i| (i, 0)));
    ring.extend((0..s).map(|j| (s, j)));
    ring.extend((1..=s).rev().map(|i| (i, s)));
    ring.extend((1..=s).rev().map(|j| (0, j)));
    ring
}

/// Build one platform per zone, in zone order.
pub fn build_zone_platforms(
    tree: &PartitionTree,
    scale: &ArenaScale,
    settings: &PlatformSettings,
    rng: &ArenaRng,
) -> Vec<(GeometryNode, GeometryBound)> {
    tree.zones()
        .enumerate()
        .map(|(zone_id, zone)| {
            let rect = zone.platform();
            let spec = SlabSpec {
                rect,
                top: zone.top(),
                thickness: scale.platform_thickness,
                strength: scale.perturb_strength,
                frequency: settings.noise_frequency,
                subdivisions: settings.subdivisions,
                noise_offset: noise_offset(rect.center(), zone_id),
            };
            let slab = build_slab(&spec, BoundKind::Platform, rng);
            let node = GeometryNode {
                name: format!("platform_{:02}", zone_id),
                role: NodeRole::Platform,
                mesh: slab.mesh,
                collider: Some(slab.collider),
            };
            (node, slab.bound)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(strength: f32, subdivisions: usize) -> SlabSpec {
        SlabSpec {
            rect: Rect::new(-10.0, -6.0, 10.0, 6.0),
            top: 4.0,
            thickness: 2.0,
            strength,
            frequency: 0.09,
            subdivisions,
            noise_offset: noise_offset(Vec2::new(0.0, 0.0), 3),
        }
    }

    #[test]
    fn test_edge_factor_profile() {
        assert_eq!(edge_factor(0.5, 0.5), 0.0);
        assert_eq!(edge_factor(0.0, 0.5), 1.0);
        assert_eq!(edge_factor(1.0, 1.0), 1.0);
        assert_eq!(edge_factor(0.5, 1.0), 1.0);
        let inner = edge_factor(0.4, 0.5);
        assert!(inner > 0.0 && inner < 1.0);
    }

    #[test]
    fn test_triangle_count_formula() {
        let rng = ArenaRng::new(1);
        for s in 1..6 {
            let slab = build_slab(&spec(1.5, s), BoundKind::Platform, &rng);
            assert_eq!(slab.mesh.triangle_count(), 4 * s * s + 8 * s);
        }
    }

    #[test]
    fn test_collider_ignores_perturbation() {
        let rng = ArenaRng::new(1);
        let slab = build_slab(&spec(1.5, 4), BoundKind::Platform, &rng);
        assert_eq!(
            slab.collider,
            Collider::Box {
                center: Vec3::new(0.0, 3.0, 0.0),
                half_extents: Vec3::new(10.0, 1.0, 6.0),
            }
        );
        assert_eq!(slab.bound.top(), 4.0);
    }

    #[test]
    fn test_top_is_flat_and_center_undisplaced() {
        let rng = ArenaRng::new(2);
        let slab = build_slab(&spec(2.0, 4), BoundKind::Platform, &rng);
        // Top face comes first: (s+1)² vertices, all at the top height
        let top: Vec<Vec3> = slab.mesh.positions[..25].to_vec();
        assert!(top.iter().all(|p| p.y == 4.0));
        // Center of the grid (i = 2, j = 2) has edge factor 0
        assert_eq!(top[2 * 5 + 2], Vec3::new(0.0, 4.0, 0.0));
        // Corners move by at most the strength
        let corner = top[0];
        assert!((corner.x + 10.0).abs() <= 2.0 + 1e-4);
        assert!((corner.z + 6.0).abs() <= 2.0 * Z_DAMPING + 1e-4);
    }

    #[test]
    fn test_faces_point_outward() {
        let rng = ArenaRng::new(3);
        let slab = build_slab(&spec(0.5, 4), BoundKind::Platform, &rng);
        let mesh = &slab.mesh;
        let top_tris = 2 * 16;
        for t in 0..mesh.triangle_count() {
            let n = mesh.face_normal(t);
            let a = mesh.positions[mesh.indices[t * 3] as usize];
            if t < 2 * top_tris {
                // Quads of top and bottom are interleaved per cell
                let expect_up = (t / 2) % 2 == 0;
                assert_eq!(n.y > 0.0, expect_up, "triangle {}", t);
            } else {
                assert!(n.y.abs() < 1e-3);
                let outward = Vec3::new(a.x, 0.0, a.z);
                assert!(n.dot(outward) > 0.0, "side triangle {} faces inward", t);
            }
        }
    }

    #[test]
    fn test_flat_box_has_no_displacement() {
        let rng = ArenaRng::new(4);
        let slab = build_slab(&spec(0.0, 3), BoundKind::Obstacle, &rng);
        let rect = Rect::new(-10.0, -6.0, 10.0, 6.0);
        for p in &slab.mesh.positions {
            assert!(rect.contains_point(Vec2::new(p.x, p.z), 1e-4));
        }
        let (lo, hi) = slab.mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-10.0, 2.0, -6.0));
        assert_eq!(hi, Vec3::new(10.0, 4.0, 6.0));
    }

    #[test]
    fn test_noise_offsets_differ_per_index() {
        let p = Vec2::new(12.0, -3.0);
        assert_ne!(noise_offset(p, 0), noise_offset(p, 1));
        assert_ne!(noise_offset(p, 0), noise_offset(Vec2::new(13.0, -3.0), 0));
    }
}
