//! Gameplay entity placement
//!
//! Every entity is dropped onto the geometry below it with
//! [`snap_to_ground`], so spawns, pickups and hazards rest on whatever
//! surface actually exists at their position.

use glam::{Vec2, Vec3};

use crate::arena::generation::connectivity::ConnectivityGraph;
use crate::arena::generation::structures::SpringSite;
use crate::arena::types::{EntityKind, HazardKind, PartitionTree, PlacedEntity, PowerUpKind};
use crate::config::PlacementSettings;
use crate::geometry::{BoundKind, GeometryBound, Rect};
use crate::seeds::ArenaRng;

/// Height above a zone top from which placement queries start
const QUERY_LIFT: f32 = 1.0;

/// Parametric probe points tried for a spawn, center first
const SPAWN_PROBES: [(f32, f32); 5] = [(0.5, 0.5), (0.3, 0.3), (0.7, 0.3), (0.3, 0.7), (0.7, 0.7)];

/// Drop `query` onto the highest bound top strictly below it.
///
/// Only bounds whose footprint contains the query's x/z (within the
/// footprint tolerance) count. The result sits `snap_offset` above that top,
/// but never above the query itself. With nothing below, the point is put
/// at `default_height`.
pub fn snap_to_ground(query: Vec3, default_height: f32, bounds: &[GeometryBound], settings: &PlacementSettings) -> Vec3 {
    let surface = bounds
        .iter()
        .filter(|b| b.contains_xz(query, settings.footprint_tolerance))
        .map(|b| b.top())
        .filter(|&top| top < query.y)
        .fold(None, |best: Option<f32>, top| Some(best.map_or(top, |b| b.max(top))));

    match surface {
        Some(top) => Vec3::new(query.x, (top + settings.snap_offset).min(query.y), query.z),
        None => Vec3::new(query.x, default_height, query.z),
    }
}

/// Bounds standing on top of the platforms: obstacles and spring pads.
fn non_platform(bounds: &[GeometryBound]) -> Vec<&GeometryBound> {
    bounds.iter().filter(|b| b.kind != BoundKind::Platform).collect()
}

/// Random point of `platform` (parametric `range` on both axes) that no
/// blocker covers. Always draws `max_attempts` candidates so the sequence
/// does not depend on where obstacles stand; falls back to the platform
/// center, which obstacles keep clear.
fn clear_point(
    platform: &Rect,
    range: [f32; 2],
    blockers: &[&GeometryBound],
    settings: &PlacementSettings,
    rng: &mut ArenaRng,
) -> Vec2 {
    let mut found = None;
    for _ in 0..settings.max_attempts.max(1) {
        let p = platform.point_at(rng.uniform(range[0], range[1]), rng.uniform(range[0], range[1]));
        let probe = Vec3::new(p.x, 0.0, p.y);
        if found.is_none() && !blockers.iter().any(|b| b.contains_xz(probe, settings.footprint_tolerance)) {
            found = Some(p);
        }
    }
    found.unwrap_or_else(|| platform.center())
}

fn query_above(tree: &PartitionTree, zone: usize, xz: Vec2) -> Vec3 {
    Vec3::new(xz.x, tree.zone(zone).top() + QUERY_LIFT, xz.y)
}

/// Spread spawn points over the arena by farthest-point sampling.
///
/// The first spawn goes to the zone farthest from the arena center; each
/// following one to the zone whose shortest-path distance to all chosen
/// spawns is largest. Zones cut off from every chosen spawn count as
/// infinitely far. Ties go to the lower zone id. At most one spawn per zone.
pub fn place_spawns(
    tree: &PartitionTree,
    graph: &ConnectivityGraph,
    bounds: &[GeometryBound],
    settings: &PlacementSettings,
) -> Vec<PlacedEntity> {
    let zone_count = tree.zone_count();
    let count = settings.spawn_count.min(zone_count);
    let mut chosen: Vec<usize> = Vec::with_capacity(count);
    if count == 0 {
        return Vec::new();
    }

    let mut first = 0;
    for z in 1..zone_count {
        if tree.zone(z).center_xz().length() > tree.zone(first).center_xz().length() {
            first = z;
        }
    }
    chosen.push(first);

    let mut nearest = vec![f32::INFINITY; zone_count];
    while chosen.len() < count {
        if let Some(&last) = chosen.last() {
            for (z, d) in graph.shortest_distances(last).into_iter().enumerate() {
                nearest[z] = nearest[z].min(d.unwrap_or(f32::INFINITY));
            }
        }
        let mut best: Option<usize> = None;
        for z in (0..zone_count).filter(|z| !chosen.contains(z)) {
            if best.map_or(true, |b| nearest[z] > nearest[b]) {
                best = Some(z);
            }
        }
        match best {
            Some(z) => chosen.push(z),
            None => break,
        }
    }

    let obstacles = non_platform(bounds);
    chosen
        .into_iter()
        .map(|zone| {
            let platform = tree.zone(zone).platform();
            let xz = SPAWN_PROBES
                .iter()
                .map(|&(u, v)| platform.point_at(u, v))
                .find(|&p| {
                    let probe = Vec3::new(p.x, 0.0, p.y);
                    !obstacles.iter().any(|b| b.contains_xz(probe, settings.footprint_tolerance))
                })
                .unwrap_or_else(|| platform.center());

            let position = snap_to_ground(query_above(tree, zone, xz), settings.default_height, bounds, settings);
            let mut facing = Vec3::new(-position.x, 0.0, -position.z).normalize_or_zero();
            if facing == Vec3::ZERO {
                facing = Vec3::Z;
            }
            PlacedEntity {
                position,
                zone,
                kind: EntityKind::Spawn { facing },
            }
        })
        .collect()
}

/// Power-ups go to the best connected zones first, preferring zones without
/// a spawn and then zones close to the center.
pub fn place_power_ups(
    tree: &PartitionTree,
    graph: &ConnectivityGraph,
    bounds: &[GeometryBound],
    spawn_zones: &[usize],
    count: usize,
    settings: &PlacementSettings,
    rng: &mut ArenaRng,
) -> Vec<PlacedEntity> {
    let mut order: Vec<usize> = (0..tree.zone_count()).collect();
    if order.is_empty() {
        return Vec::new();
    }
    order.sort_by(|&a, &b| {
        spawn_zones
            .contains(&a)
            .cmp(&spawn_zones.contains(&b))
            .then_with(|| graph.degree(b).cmp(&graph.degree(a)))
            .then_with(|| {
                tree.zone(a)
                    .center_xz()
                    .length()
                    .total_cmp(&tree.zone(b).center_xz().length())
            })
            .then_with(|| a.cmp(&b))
    });

    let blockers = non_platform(bounds);
    (0..count)
        .map(|i| {
            let zone = order[i % order.len()];
            let platform = tree.zone(zone).platform();
            let xz = clear_point(&platform, [0.1, 0.9], &blockers, settings, rng);
            let power_up = PowerUpKind::ALL[rng.index(PowerUpKind::ALL.len())];
            PlacedEntity {
                position: snap_to_ground(query_above(tree, zone, xz), settings.default_height, bounds, settings),
                zone,
                kind: EntityKind::PowerUp {
                    power_up,
                    respawn_secs: power_up.respawn_secs(),
                },
            }
        })
        .collect()
}

/// Initial velocity of a ballistic arc from `from` to `to` whose apex sits
/// `apex_clearance` above the higher end.
pub fn solve_launch(from: Vec3, to: Vec3, gravity: f32, apex_clearance: f32) -> Vec3 {
    let apex = from.y.max(to.y) + apex_clearance.max(0.0);
    let rise = (apex - from.y).max(0.0);
    let fall = (apex - to.y).max(0.0);
    let vy = (2.0 * gravity * rise).sqrt();
    let flight = vy / gravity + (2.0 * fall / gravity).sqrt();
    if flight <= 0.0 {
        return Vec3::new(0.0, vy, 0.0);
    }
    let horizontal = Vec2::new(to.x - from.x, to.z - from.z) / flight;
    Vec3::new(horizontal.x, vy, horizontal.y)
}

/// Turn spring sites into spring entities launching toward their target zone.
pub fn place_springs(
    tree: &PartitionTree,
    sites: &[SpringSite],
    bounds: &[GeometryBound],
    settings: &PlacementSettings,
) -> Vec<PlacedEntity> {
    sites
        .iter()
        .map(|site| {
            let query = site.position + Vec3::Y * QUERY_LIFT;
            // The pad's own bound is registered, so this lands on the pad top
            let position = snap_to_ground(query, site.position.y, bounds, settings);
            let landing = tree.zone(site.target_zone).center + Vec3::Y * settings.snap_offset;
            PlacedEntity {
                position,
                zone: site.zone,
                kind: EntityKind::Spring {
                    launch_velocity: solve_launch(position, landing, settings.gravity, settings.spring_apex_clearance),
                    target_zone: site.target_zone,
                },
            }
        })
        .collect()
}

/// Hazards go to the lowest zones that host no spawn.
pub fn place_hazards(
    tree: &PartitionTree,
    bounds: &[GeometryBound],
    spawn_zones: &[usize],
    count: usize,
    settings: &PlacementSettings,
    rng: &mut ArenaRng,
) -> Vec<PlacedEntity> {
    let mut order: Vec<usize> = (0..tree.zone_count()).filter(|z| !spawn_zones.contains(z)).collect();
    if order.is_empty() {
        if count > 0 {
            log::info!("Every zone hosts a spawn, no hazards placed");
        }
        return Vec::new();
    }
    order.sort_by(|&a, &b| tree.zone(a).top().total_cmp(&tree.zone(b).top()).then_with(|| a.cmp(&b)));
    let blockers = non_platform(bounds);

    (0..count)
        .map(|i| {
            let zone = order[i % order.len()];
            let platform = tree.zone(zone).platform();
            let hazard = HazardKind::ALL[rng.index(HazardKind::ALL.len())];
            let xz = clear_point(&platform, [0.2, 0.8], &blockers, settings, rng);
            PlacedEntity {
                position: snap_to_ground(query_above(tree, zone, xz), settings.default_height, bounds, settings),
                zone,
                kind: EntityKind::Hazard {
                    hazard,
                    radius: hazard.radius_share() * platform.size().min_element(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(min_x: f32, min_z: f32, max_x: f32, max_z: f32, top: f32) -> GeometryBound {
        GeometryBound::from_rect(&Rect::new(min_x, min_z, max_x, max_z), top - 1.0, top, BoundKind::Platform)
    }

    #[test]
    fn test_snap_picks_highest_surface_below() {
        let settings = PlacementSettings::default();
        let bounds = vec![
            slab(-10.0, -10.0, 10.0, 10.0, 2.0),
            slab(-2.0, -2.0, 2.0, 2.0, 5.0),
            slab(-1.0, -1.0, 1.0, 1.0, 12.0),
        ];
        let p = snap_to_ground(Vec3::new(0.0, 8.0, 0.0), 0.0, &bounds, &settings);
        assert!((p.y - 5.1).abs() < 1e-5);
        let p = snap_to_ground(Vec3::new(5.0, 8.0, 5.0), 0.0, &bounds, &settings);
        assert!((p.y - 2.1).abs() < 1e-5);
    }

    #[test]
    fn test_snap_falls_back_to_default_height() {
        let settings = PlacementSettings::default();
        let bounds = vec![slab(-1.0, -1.0, 1.0, 1.0, 3.0)];
        let p = snap_to_ground(Vec3::new(40.0, 10.0, 40.0), -7.5, &bounds, &settings);
        assert_eq!(p, Vec3::new(40.0, -7.5, 40.0));
        // Surface above the query does not count
        let p = snap_to_ground(Vec3::new(0.0, 1.0, 0.0), -7.5, &bounds, &settings);
        assert_eq!(p.y, -7.5);
        let p = snap_to_ground(Vec3::new(0.0, 1.0, 0.0), -7.5, &[], &settings);
        assert_eq!(p.y, -7.5);
    }

    #[test]
    fn test_snap_never_rises_above_query() {
        let settings = PlacementSettings::default();
        let bounds = vec![slab(-5.0, -5.0, 5.0, 5.0, 3.0), slab(-1.0, -1.0, 1.0, 1.0, 4.0)];
        for i in 1..=100 {
            let y = 3.0 + i as f32 * 0.013;
            let p = snap_to_ground(Vec3::new(0.5, y, -0.5), -100.0, &bounds, &settings);
            assert!(p.y <= y, "query {} snapped up to {}", y, p.y);
            assert!(p.y >= 3.0);
        }
    }

    #[test]
    fn test_snap_respects_footprint_tolerance() {
        let settings = PlacementSettings::default();
        let bounds = vec![slab(0.0, 0.0, 4.0, 4.0, 1.0)];
        let inside = snap_to_ground(Vec3::new(4.04, 5.0, 2.0), 0.0, &bounds, &settings);
        assert!((inside.y - 1.1).abs() < 1e-5);
        let outside = snap_to_ground(Vec3::new(4.2, 5.0, 2.0), 0.0, &bounds, &settings);
        assert_eq!(outside.y, 0.0);
    }

    #[test]
    fn test_launch_lands_on_target() {
        let from = Vec3::new(0.0, 2.0, 0.0);
        let to = Vec3::new(12.0, 7.0, -5.0);
        let g = 20.0;
        let v = solve_launch(from, to, g, 3.0);
        assert!(v.y > 0.0);

        // Integrate the arc until it comes back down to the target height
        let dt = 1e-4;
        let mut p = from;
        let mut vel = v;
        let mut apex = p.y;
        loop {
            vel.y -= g * dt;
            p += vel * dt;
            apex = apex.max(p.y);
            if vel.y < 0.0 && p.y <= to.y {
                break;
            }
        }
        assert!((apex - 10.0).abs() < 0.05, "apex {}", apex);
        assert!(Vec2::new(p.x - to.x, p.z - to.z).length() < 0.1);
    }

    #[test]
    fn test_clear_point_avoids_blockers_with_fixed_draws() {
        let settings = PlacementSettings::default();
        let platform = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Cover everything but a strip along x > 8
        let cover = GeometryBound::from_rect(&Rect::new(-1.0, -1.0, 8.0, 11.0), 0.0, 5.0, BoundKind::Obstacle);
        let blockers = vec![&cover];

        let mut open = ArenaRng::new(3);
        let mut covered = ArenaRng::new(3);
        let free = clear_point(&platform, [0.0, 1.0], &[], &settings, &mut open);
        let p = clear_point(&platform, [0.0, 1.0], &blockers, &settings, &mut covered);
        assert!(platform.contains_point(free, 0.0));
        assert!(!cover.contains_xz(Vec3::new(p.x, 0.0, p.y), settings.footprint_tolerance) || p == platform.center());
        assert_eq!(open.draw_count(), covered.draw_count());
    }
}
