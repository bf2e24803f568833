//! Cover obstacles and spring pads placed on top of the zone platforms

use glam::{Vec2, Vec3};

use crate::arena::types::PartitionTree;
use crate::config::{PlacementSettings, PlatformSettings};
use crate::geometry::mesh::MeshData;
use crate::geometry::{BoundKind, Collider, GeometryBound, GeometryNode, NodeRole, Rect};
use crate::scale::ArenaScale;
use crate::seeds::ArenaRng;

use super::platforms::{build_slab, noise_offset, SlabSpec};

/// Obstacle footprint relative to the smaller side of its platform
const OBSTACLE_SIZE_SHARE: [f32; 2] = [0.12, 0.3];

/// Obstacle height relative to the footprint
const OBSTACLE_HEIGHT_SHARE: [f32; 2] = [0.02, 0.06];

/// Obstacles keep the middle of their platform clear for spawns
const CLEAR_CENTER_SHARE: f32 = 0.15;

/// Spring pad half extents
const PAD_HALF_EXTENTS: Vec3 = Vec3::new(0.6, 0.1, 0.6);

/// Minimum height gain for a spring target
const MIN_SPRING_RISE: f32 = 0.5;

/// Place cover obstacles on random platforms.
///
/// Each obstacle gets up to `max_attempts` tries at a footprint that lies
/// inside its platform, keeps the platform center free and does not overlap
/// an obstacle placed earlier. Obstacles that find no spot are dropped.
pub fn place_obstacles(
    tree: &PartitionTree,
    scale: &ArenaScale,
    platforms: &PlatformSettings,
    placement: &PlacementSettings,
    count: usize,
    rng: &mut ArenaRng,
) -> Vec<(GeometryNode, GeometryBound)> {
    let zone_count = tree.zone_count();
    let mut placed: Vec<(GeometryNode, GeometryBound)> = Vec::new();
    if zone_count == 0 {
        return placed;
    }
    let margin = scale.min_zone_size * 0.05;

    for _ in 0..count {
        let mut spot = None;
        for _ in 0..placement.max_attempts {
            let zone_id = rng.index(zone_count);
            let zone = tree.zone(zone_id);
            let platform = zone.platform();
            let side = platform.size().min_element();
            let w = side * rng.uniform(OBSTACLE_SIZE_SHARE[0], OBSTACLE_SIZE_SHARE[1]);
            let d = side * rng.uniform(OBSTACLE_SIZE_SHARE[0], OBSTACLE_SIZE_SHARE[1]);
            let height = scale.footprint * rng.uniform(OBSTACLE_HEIGHT_SHARE[0], OBSTACLE_HEIGHT_SHARE[1]);
            let cx = rng.uniform(platform.min.x + w * 0.5, platform.max.x - w * 0.5);
            let cz = rng.uniform(platform.min.y + d * 0.5, platform.max.y - d * 0.5);
            let rect = Rect::from_center(Vec2::new(cx, cz), Vec2::new(w, d));

            let keep_clear = Rect::from_center(platform.center(), Vec2::splat(side * CLEAR_CENTER_SHARE * 2.0));
            if !platform.contains_rect(&rect, 1e-4) || rect.overlaps(&keep_clear, 0.0) {
                continue;
            }
            if placed.iter().any(|(_, b)| b.footprint().overlaps(&rect, margin)) {
                continue;
            }
            spot = Some((zone_id, rect, height));
            break;
        }

        let Some((zone_id, rect, height)) = spot else {
            continue;
        };
        let index = placed.len();
        let spec = SlabSpec {
            rect,
            top: tree.zone(zone_id).top() + height,
            thickness: height,
            strength: scale.perturb_strength * 0.5,
            frequency: platforms.noise_frequency,
            subdivisions: platforms.subdivisions.min(2),
            noise_offset: noise_offset(rect.center(), 1000 + index),
        };
        let slab = build_slab(&spec, BoundKind::Obstacle, rng);
        let node = GeometryNode {
            name: format!("obstacle_{:02}", index),
            role: NodeRole::Obstacle,
            mesh: slab.mesh,
            collider: Some(slab.collider),
        };
        placed.push((node, slab.bound));
    }

    if placed.len() < count {
        log::info!(
            "Placed {} of {} obstacles; the rest found no free spot",
            placed.len(),
            count
        );
    }
    placed
}

/// A spring pad launching players from one zone to a higher one
#[derive(Clone, Debug, PartialEq)]
pub struct SpringSite {
    pub zone: usize,
    pub target_zone: usize,
    /// Top center of the pad
    pub position: Vec3,
    pub node: GeometryNode,
    pub bound: GeometryBound,
}

/// Nearest zone at least slightly higher than `zone_id` within `max_distance`.
pub fn spring_target(tree: &PartitionTree, zone_id: usize, max_distance: f32) -> Option<usize> {
    let from = tree.zone(zone_id);
    (0..tree.zone_count())
        .filter(|&z| z != zone_id)
        .filter(|&z| {
            let to = tree.zone(z);
            to.top() >= from.top() + MIN_SPRING_RISE && to.center_xz().distance(from.center_xz()) <= max_distance
        })
        .min_by(|&a, &b| {
            let da = tree.zone(a).center_xz().distance(from.center_xz());
            let db = tree.zone(b).center_xz().distance(from.center_xz());
            da.total_cmp(&db)
        })
}

/// Pad offsets from the zone center, as shares of the platform's smaller
/// side, along the direction to the target and then across it
const PAD_OFFSETS: [(f32, f32); 5] = [(0.35, 0.0), (0.25, 0.0), (0.15, 0.0), (0.0, 0.3), (0.0, -0.3)];

/// Choose spring pad sites: zones with a reachable higher neighbour, one pad
/// per zone, pad set on the platform edge facing the target.
///
/// Pads avoid the obstacles already in `bounds`; a zone whose candidate pad
/// spots are all covered gets no pad.
pub fn plan_spring_sites(
    tree: &PartitionTree,
    scale: &ArenaScale,
    bounds: &[GeometryBound],
    count: usize,
    rng: &mut ArenaRng,
) -> Vec<SpringSite> {
    let candidates: Vec<(usize, usize)> = (0..tree.zone_count())
        .filter_map(|z| spring_target(tree, z, scale.connection_distance).map(|t| (z, t)))
        .collect();

    let mut sites: Vec<SpringSite> = Vec::new();
    if candidates.is_empty() {
        if count > 0 {
            log::info!("No zone has a higher neighbour in range, no springs placed");
        }
        return sites;
    }

    let obstacles: Vec<Rect> = bounds
        .iter()
        .filter(|b| b.kind == BoundKind::Obstacle)
        .map(|b| b.footprint())
        .collect();
    let mut blocked: Vec<usize> = Vec::new();

    while sites.len() < count {
        let free: Vec<&(usize, usize)> = candidates
            .iter()
            .filter(|(z, _)| !blocked.contains(z) && !sites.iter().any(|s| s.zone == *z))
            .collect();
        if free.is_empty() {
            log::info!("Placed {} of {} springs; no candidate zone has room left", sites.len(), count);
            break;
        }
        let &(zone_id, target_zone) = free[rng.index(free.len())];

        let zone = tree.zone(zone_id);
        let toward = (tree.zone(target_zone).center_xz() - zone.center_xz()).normalize_or_zero();
        let across = Vec2::new(-toward.y, toward.x);
        let side = zone.platform().size().min_element();
        let pad_size = Vec2::new(PAD_HALF_EXTENTS.x, PAD_HALF_EXTENTS.z) * 2.0;
        let spot = PAD_OFFSETS
            .iter()
            .map(|&(along, lateral)| zone.center_xz() + toward * along * side + across * lateral * side)
            .find(|&xz| {
                let pad = Rect::from_center(xz, pad_size);
                !obstacles.iter().any(|o| o.overlaps(&pad, 0.0))
            });
        let Some(xz) = spot else {
            log::debug!("Zone {} has no pad spot clear of obstacles", zone_id);
            blocked.push(zone_id);
            continue;
        };
        let position = Vec3::new(xz.x, zone.top() + PAD_HALF_EXTENTS.y * 2.0, xz.y);

        let pad_center = position - Vec3::Y * PAD_HALF_EXTENTS.y;
        let bound = GeometryBound {
            position: pad_center,
            size: PAD_HALF_EXTENTS * 2.0,
            kind: BoundKind::SpringPad,
        };
        let node = GeometryNode {
            name: format!("spring_{:02}", sites.len()),
            role: NodeRole::SpringPad,
            mesh: MeshData::cuboid(pad_center, PAD_HALF_EXTENTS),
            collider: Some(Collider::Box {
                center: pad_center,
                half_extents: PAD_HALF_EXTENTS,
            }),
        };
        sites.push(SpringSite {
            zone: zone_id,
            target_zone,
            position,
            node,
            bound,
        });
    }
    sites
}
