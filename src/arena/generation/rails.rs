//! Rails: Bézier paths through control points, extruded into tubes
//!
//! A rail is a list of control points with tangent handles. The path between
//! two points is a cubic Bézier; the tube is a ring of vertices swept along
//! the path at evenly spaced arc-length offsets.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::arena::types::{PartitionTree, Rail, RailHandle, RailKind, RailTube};
use crate::config::{ComplexityBudget, RailSettings};
use crate::geometry::mesh::MeshData;
use crate::geometry::Collider;
use crate::scale::ArenaScale;
use crate::seeds::ArenaRng;

/// Attempts to find a fresh zone pair before a rail is given up
const MAX_PAIR_ATTEMPTS: usize = 8;

/// Squared length under which a direction is considered degenerate
const DIRECTION_EPSILON: f32 = 1e-6;

/// Smallest vertical loop a player can ride
const MIN_LOOP_RADIUS: f32 = 1.5;

/// Tangent handles for every control point.
///
/// Endpoints follow their single neighbour; interior points average the
/// directions of the two adjacent segments. Each handle is capped at a third
/// of its segment so short segments don't overshoot.
pub fn compute_handles(points: &[Vec3], handle_length: f32) -> Vec<RailHandle> {
    let n = points.len();
    (0..n)
        .map(|i| {
            if n < 2 {
                return RailHandle {
                    inbound: Vec3::ZERO,
                    outbound: Vec3::ZERO,
                };
            }
            let tangent = if i == 0 {
                (points[1] - points[0]).normalize_or_zero()
            } else if i == n - 1 {
                (points[n - 1] - points[n - 2]).normalize_or_zero()
            } else {
                let to_here = (points[i] - points[i - 1]).normalize_or_zero();
                let from_here = (points[i + 1] - points[i]).normalize_or_zero();
                (to_here + from_here).normalize_or_zero()
            };

            let in_len = if i > 0 {
                handle_length.min(points[i].distance(points[i - 1]) / 3.0)
            } else {
                handle_length.min(points[1].distance(points[0]) / 3.0)
            };
            let out_len = if i + 1 < n {
                handle_length.min(points[i + 1].distance(points[i]) / 3.0)
            } else {
                in_len
            };
            RailHandle {
                inbound: -tangent * in_len,
                outbound: tangent * out_len,
            }
        })
        .collect()
}

fn bezier(p0: Vec3, c1: Vec3, c2: Vec3, p1: Vec3, t: f32) -> Vec3 {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + c1 * (3.0 * mt * mt * t) + c2 * (3.0 * mt * t * t) + p1 * (t * t * t)
}

/// Flattened rail path with cumulative arc length.
#[derive(Clone, Debug, PartialEq)]
pub struct RailPath {
    points: Vec<Vec3>,
    cumulative: Vec<f32>,
}

impl RailPath {
    pub fn from_control_points(points: &[Vec3], handles: &[RailHandle], steps: usize) -> Self {
        let steps = steps.max(1);
        let mut flat = Vec::with_capacity(points.len().saturating_sub(1) * steps + 1);
        if let Some(&first) = points.first() {
            flat.push(first);
        }
        for k in 0..points.len().saturating_sub(1) {
            let p0 = points[k];
            let p1 = points[k + 1];
            let c1 = p0 + handles[k].outbound;
            let c2 = p1 + handles[k + 1].inbound;
            for step in 1..=steps {
                flat.push(bezier(p0, c1, c2, p1, step as f32 / steps as f32));
            }
        }

        let mut cumulative = Vec::with_capacity(flat.len());
        let mut total = 0.0;
        for (i, p) in flat.iter().enumerate() {
            if i > 0 {
                total += p.distance(flat[i - 1]);
            }
            cumulative.push(total);
        }
        Self {
            points: flat,
            cumulative,
        }
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point and unit tangent at arc length `distance` (clamped to the path).
    /// The tangent is zero on a degenerate stretch.
    pub fn sample(&self, distance: f32) -> (Vec3, Vec3) {
        match self.points.len() {
            0 => return (Vec3::ZERO, Vec3::ZERO),
            1 => return (self.points[0], Vec3::ZERO),
            _ => {}
        }
        let d = distance.clamp(0.0, self.length());
        let upper = self
            .cumulative
            .partition_point(|&c| c < d)
            .clamp(1, self.points.len() - 1);
        let lower = upper - 1;
        let span = self.cumulative[upper] - self.cumulative[lower];
        let a = self.points[lower];
        let b = self.points[upper];
        let t = if span > 0.0 {
            (d - self.cumulative[lower]) / span
        } else {
            0.0
        };
        (a.lerp(b, t), (b - a).normalize_or_zero())
    }
}

/// Ring samples for a path of the given length: proportional to length,
/// clamped to the configured bounds.
pub fn ring_sample_count(length: f32, settings: &RailSettings) -> usize {
    let raw = (length.max(0.0) * settings.samples_per_unit).ceil() as usize;
    raw.clamp(settings.min_samples, settings.max_samples)
}

/// Last valid sweep frame, reused through degenerate stretches
struct FrameCache {
    forward: Vec3,
    right: Option<Vec3>,
}

impl FrameCache {
    fn new() -> Self {
        Self {
            forward: Vec3::X,
            right: None,
        }
    }

    /// `(right, up)` for a tangent.
    fn frame(&mut self, tangent: Vec3) -> (Vec3, Vec3) {
        let forward = if tangent.length_squared() > DIRECTION_EPSILON {
            tangent.normalize()
        } else {
            self.forward
        };

        let mut right = forward.cross(Vec3::Y);
        if right.length_squared() < DIRECTION_EPSILON {
            // Locally vertical
            right = self.right.map_or(Vec3::ZERO, |r| forward.cross(r));
            if right.length_squared() < DIRECTION_EPSILON {
                right = forward.cross(Vec3::X);
            }
        }
        let right = right.normalize();
        let up = right.cross(forward);

        self.forward = forward;
        self.right = Some(right);
        (right, up)
    }
}

/// Sweep a circular cross-section along `path`.
///
/// Returns `None` for paths shorter than the minimum renderable length.
pub fn build_tube(path: &RailPath, settings: &RailSettings) -> Option<RailTube> {
    let length = path.length();
    if length < settings.min_render_length {
        return None;
    }

    let samples = ring_sample_count(length, settings);
    let m = settings.ring_segments.max(3);
    let radius = settings.radius;

    let mut mesh = MeshData::new();
    let mut centers = Vec::with_capacity(samples);
    let mut frames = FrameCache::new();
    let mut previous_ring: Option<u32> = None;

    for i in 0..samples {
        let s = length * i as f32 / (samples - 1) as f32;
        let (center, tangent) = path.sample(s);
        if let Some(&last) = centers.last() {
            if center.distance(last) < settings.degenerate_epsilon {
                continue;
            }
        }

        let (right, up) = frames.frame(tangent);
        let base = mesh.vertex_count() as u32;
        // One extra vertex closes the UV seam
        for j in 0..=m {
            let angle = j as f32 / m as f32 * TAU;
            let dir = right * angle.cos() + up * angle.sin();
            mesh.push_vertex(center + dir * radius, dir, Vec2::new(s / length, j as f32 / m as f32));
        }

        if let Some(prev) = previous_ring {
            for j in 0..m as u32 {
                mesh.push_quad(prev + j, base + j, base + j + 1, prev + j + 1);
            }
        }
        previous_ring = Some(base);
        centers.push(center);
    }

    Some(RailTube {
        mesh,
        collider: Collider::Tube { centers, radius },
    })
}

/// Build a rail from control points: handles, path, and a tube if long enough.
pub fn build_rail(kind: RailKind, control_points: Vec<Vec3>, zones: Vec<usize>, settings: &RailSettings) -> Rail {
    let handles = compute_handles(&control_points, settings.handle_length);
    let path = RailPath::from_control_points(&control_points, &handles, settings.flatten_steps);
    let length = path.length();
    let tube = build_tube(&path, settings);
    if tube.is_none() {
        log::debug!(
            "{} rail of length {:.2} is below the renderable minimum, no tube built",
            kind.name(),
            length
        );
    }
    Rail {
        kind,
        control_points,
        handles,
        zones,
        length,
        sample_count: ring_sample_count(length, settings),
        tube,
    }
}

/// Plan and build every rail of the arena: grind rails, spirals, branches
/// and loops, in that order.
pub fn plan_rails(
    tree: &PartitionTree,
    scale: &ArenaScale,
    budget: &ComplexityBudget,
    settings: &RailSettings,
    rng: &mut ArenaRng,
) -> Vec<Rail> {
    let zone_count = tree.zone_count();
    let mut rails = Vec::new();
    if zone_count == 0 {
        return rails;
    }

    // Grind rails between a random zone and its nearest unlinked neighbour
    let mut linked: Vec<(usize, usize)> = Vec::new();
    if zone_count >= 2 {
        for _ in 0..budget.grind_rails {
            let mut pair = None;
            for _ in 0..MAX_PAIR_ATTEMPTS {
                let a = rng.index(zone_count);
                let origin = tree.zone(a).center;
                let nearest = (0..zone_count)
                    .filter(|&b| b != a && !linked.contains(&(a.min(b), a.max(b))))
                    .min_by(|&x, &y| {
                        origin
                            .distance(tree.zone(x).center)
                            .total_cmp(&origin.distance(tree.zone(y).center))
                    });
                if let Some(b) = nearest {
                    pair = Some((a, b));
                    break;
                }
            }
            match pair {
                Some((a, b)) => {
                    linked.push((a.min(b), a.max(b)));
                    rails.push(grind_rail(tree, a, b, scale, settings, rng));
                }
                None => log::info!("No free zone pair left for a grind rail"),
            }
        }
    }

    for _ in 0..budget.spirals {
        let zone = rng.index(zone_count);
        rails.push(spiral_rail(tree, zone, scale, settings, rng));
    }

    let grind_count = rails.iter().filter(|r| r.kind == RailKind::Grind).count();
    for _ in 0..budget.branches {
        if grind_count == 0 {
            log::info!("Skipping branch rails: no grind rail to branch from");
            break;
        }
        let parent = rng.index(grind_count);
        let parent = rails
            .iter()
            .filter(|r| r.kind == RailKind::Grind)
            .nth(parent)
            .cloned();
        if let Some(parent) = parent {
            match branch_rail(tree, &parent, scale, settings, rng) {
                Some(rail) => rails.push(rail),
                None => log::info!("Branch rail has no zone to reach"),
            }
        }
    }

    for _ in 0..budget.loops {
        let zone = rng.index(zone_count);
        rails.push(loop_rail(tree, zone, scale, settings, rng));
    }

    rails
}

fn grind_rail(
    tree: &PartitionTree,
    a: usize,
    b: usize,
    scale: &ArenaScale,
    settings: &RailSettings,
    rng: &mut ArenaRng,
) -> Rail {
    let za = tree.zone(a);
    let zb = tree.zone(b);
    let lift = Vec3::Y * scale.rail_clearance;
    let flat_dir = {
        let d = zb.center - za.center;
        Vec3::new(d.x, 0.0, d.z).normalize_or_zero()
    };
    let reach_a = 0.25 * za.platform().size().min_element();
    let reach_b = 0.25 * zb.platform().size().min_element();
    let start = za.center + flat_dir * reach_a + lift;
    let end = zb.center - flat_dir * reach_b + lift;

    let arch = scale.rail_arch * rng.uniform(0.5, 1.5);
    let side = flat_dir.cross(Vec3::Y).normalize_or_zero();
    let chord = start.distance(end);

    let mut points = vec![start];
    for t in [0.25_f32, 0.5, 0.75] {
        let wobble = rng.noise2(a as f32 * 7.13 + t * 3.1, b as f32 * 3.37 + t * 1.7);
        points.push(start.lerp(end, t) + Vec3::Y * arch * (PI * t).sin() + side * wobble * 0.1 * chord);
    }
    points.push(end);
    build_rail(RailKind::Grind, points, vec![a, b], settings)
}

fn spiral_rail(
    tree: &PartitionTree,
    zone_id: usize,
    scale: &ArenaScale,
    settings: &RailSettings,
    rng: &mut ArenaRng,
) -> Rail {
    let zone = tree.zone(zone_id);
    let radius = 0.3 * zone.platform().size().min_element();
    let turns = rng.uniform(1.0, 2.0);
    let climb = rng.uniform(0.08, 0.16) * scale.footprint;
    let start_angle = rng.angle();

    let count = (turns * 8.0).ceil() as usize + 1;
    let points = (0..count)
        .map(|k| {
            let t = k as f32 / (count - 1) as f32;
            let angle = start_angle + t * turns * TAU;
            zone.center
                + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
                + Vec3::Y * (scale.rail_clearance + climb * t)
        })
        .collect();
    build_rail(RailKind::Spiral, points, vec![zone_id], settings)
}

fn branch_rail(
    tree: &PartitionTree,
    parent: &Rail,
    scale: &ArenaScale,
    settings: &RailSettings,
    rng: &mut ArenaRng,
) -> Option<Rail> {
    let start = parent.control_points[parent.control_points.len() / 2];
    let target = (0..tree.zone_count())
        .filter(|z| !parent.zones.contains(z))
        .min_by(|&x, &y| {
            start
                .distance(tree.zone(x).center)
                .total_cmp(&start.distance(tree.zone(y).center))
        });
    // Draw regardless of the outcome to keep the sequence shape independent
    let arch = rng.uniform(0.5, 1.0) * scale.rail_arch * 0.5;
    let target = target?;

    let end = tree.zone(target).center + Vec3::Y * scale.rail_clearance;
    let mid = start.lerp(end, 0.5) + Vec3::Y * arch;
    let mut zones = parent.zones.clone();
    zones.push(target);
    Some(build_rail(RailKind::Branch, vec![start, mid, end], zones, settings))
}

fn loop_rail(
    tree: &PartitionTree,
    zone_id: usize,
    scale: &ArenaScale,
    settings: &RailSettings,
    rng: &mut ArenaRng,
) -> Rail {
    let zone = tree.zone(zone_id);
    let heading = rng.angle();
    let forward = Vec3::new(heading.cos(), 0.0, heading.sin());
    let side = forward.cross(Vec3::Y);

    // Small arenas can push the upper bound below the minimum radius
    let max_radius = (scale.footprint * 0.08).max(MIN_LOOP_RADIUS);
    let radius = (0.3 * zone.platform().size().min_element()).clamp(MIN_LOOP_RADIUS, max_radius);
    let drift = radius * 0.4;
    let base = zone.center + Vec3::Y * scale.rail_clearance * 0.5;

    let mut points = vec![base - forward * radius * 1.6];
    for k in 0..=8 {
        let t = k as f32 / 8.0;
        let theta = t * TAU;
        points.push(
            base + forward * radius * theta.sin()
                + Vec3::Y * radius * (1.0 - theta.cos())
                + side * drift * t,
        );
    }
    points.push(base + forward * radius * 1.6 + side * drift);
    build_rail(RailKind::Loop, points, vec![zone_id], settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RailSettings {
        RailSettings::default()
    }

    #[test]
    fn test_endpoint_handles_follow_neighbour() {
        let points = vec![Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 30.0)];
        let handles = compute_handles(&points, 4.0);
        assert_eq!(handles[0].outbound, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(handles[0].inbound, Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(handles[2].inbound, Vec3::new(0.0, 0.0, -4.0));
        // Interior handle bisects the corner
        let mid = handles[1].outbound.normalize();
        assert!((mid - Vec3::new(1.0, 0.0, 1.0).normalize()).length() < 1e-5);
        assert!((handles[1].outbound.length() - 4.0).abs() < 1e-5);
        assert!((handles[1].inbound + handles[1].outbound).length() < 1e-5);
    }

    #[test]
    fn test_handles_capped_on_short_segments() {
        let points = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)];
        let handles = compute_handles(&points, 4.0);
        assert!((handles[0].outbound.length() - 1.0 / 3.0).abs() < 1e-6);
        assert!((handles[1].inbound.length() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_count_bounds_and_monotonic() {
        let s = settings();
        let mut previous = 0;
        for i in 0..2000 {
            let length = i as f32 * 0.25;
            let count = ring_sample_count(length, &s);
            assert!((4..=200).contains(&count));
            assert!(count >= previous, "count decreased at length {}", length);
            previous = count;
        }
        assert_eq!(ring_sample_count(0.0, &s), 4);
        assert_eq!(ring_sample_count(10_000.0, &s), 200);
    }

    #[test]
    fn test_short_rail_has_no_tube() {
        let rail = build_rail(
            RailKind::Grind,
            vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
            vec![],
            &settings(),
        );
        assert_eq!(rail.control_points.len(), 2);
        assert_eq!(rail.handles.len(), 2);
        assert!((rail.length - 1.0).abs() < 1e-4);
        assert!(!rail.has_tube());
        assert_eq!(rail.triangle_count(), 0);
    }

    #[test]
    fn test_straight_tube_topology() {
        let s = settings();
        let rail = build_rail(
            RailKind::Grind,
            vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
            vec![],
            &s,
        );
        let tube = rail.tube.as_ref().unwrap();
        // 10 units at 1.5 samples per unit, give or take float rounding
        let n = rail.sample_count;
        assert!(n == 15 || n == 16, "sample count {}", n);
        assert_eq!(tube.mesh.vertex_count(), n * 9);
        assert_eq!(tube.mesh.triangle_count(), (n - 1) * 8 * 2);
        match &tube.collider {
            Collider::Tube { centers, radius } => {
                assert_eq!(centers.len(), n);
                assert_eq!(*radius, s.radius);
            }
            other => panic!("unexpected collider {:?}", other),
        }
    }

    #[test]
    fn test_tube_faces_outward() {
        let points = vec![
            Vec3::ZERO,
            Vec3::new(8.0, 0.0, 0.0),
            Vec3::new(8.0, 2.0, 8.0),
            Vec3::new(16.0, 4.0, 8.0),
        ];
        let rail = build_rail(RailKind::Grind, points, vec![], &settings());
        let mesh = &rail.tube.as_ref().unwrap().mesh;
        for t in 0..mesh.triangle_count() {
            let n = mesh.face_normal(t);
            if n.length_squared() < 1e-10 {
                continue;
            }
            let vertex_normal = mesh.normals[mesh.indices[t * 3] as usize];
            assert!(n.dot(vertex_normal) > 0.0, "triangle {} faces inward", t);
        }
    }

    #[test]
    fn test_vertical_path_uses_fallback_frame() {
        let rail = build_rail(
            RailKind::Loop,
            vec![Vec3::ZERO, Vec3::new(0.0, 6.0, 0.0)],
            vec![],
            &settings(),
        );
        let mesh = &rail.tube.as_ref().unwrap().mesh;
        assert!(mesh.triangle_count() > 0);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(p.is_finite() && n.is_finite());
            // Ring normals are horizontal on a vertical path
            assert!(n.y.abs() < 1e-4);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_coincident_points_are_skipped() {
        let rail = build_rail(
            RailKind::Grind,
            vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)],
            vec![],
            &settings(),
        );
        let tube = rail.tube.as_ref().unwrap();
        for t in 0..tube.mesh.triangle_count() {
            assert!(tube.mesh.face_normal(t).length_squared() > 1e-10, "zero-area triangle {}", t);
        }
        if let Collider::Tube { centers, .. } = &tube.collider {
            for pair in centers.windows(2) {
                assert!(pair[0].distance(pair[1]) >= settings().degenerate_epsilon);
            }
        }
    }

    #[test]
    fn test_path_sampling_endpoints() {
        let points = vec![Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 6.0)];
        let handles = compute_handles(&points, 2.0);
        let path = RailPath::from_control_points(&points, &handles, 12);
        let (start, _) = path.sample(-1.0);
        let (end, _) = path.sample(path.length() + 1.0);
        assert_eq!(start, Vec3::ZERO);
        assert!((end - Vec3::new(6.0, 0.0, 6.0)).length() < 1e-5);
        assert!(path.length() > 6.0 * 2.0_f32.sqrt());
    }
}
