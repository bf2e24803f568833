//! Zone finalization and height symmetry
//!
//! Leaves of the partition become zones: each receives an id, an inset
//! platform footprint and a 3D center. The symmetry pass then copies heights
//! from the positive-x half onto the negative-x half so both sides of the
//! arena share the same vertical profile.

use crate::arena::types::{NodeId, PartitionTree};
use crate::seeds::ArenaRng;

/// Assign id, platform rect and center to one leaf.
pub fn finalize_zone(
    tree: &mut PartitionTree,
    leaf: NodeId,
    zone_id: usize,
    inset_range: [f32; 2],
    rng: &mut ArenaRng,
) {
    let inset = rng.uniform(inset_range[0], inset_range[1]);
    let node = tree.node_mut(leaf);
    debug_assert!(node.is_leaf(), "finalize_zone called on an internal node");

    let platform = node.bounds.inset(inset);
    let c = platform.center();
    node.zone_id = Some(zone_id);
    node.platform_rect = Some(platform);
    node.center = glam::Vec3::new(c.x, node.height_offset, c.y);
}

/// Finalize every leaf in leaf order; zone ids follow that order.
pub fn finalize_zones(tree: &mut PartitionTree, inset_range: [f32; 2], rng: &mut ArenaRng) {
    let leaves = tree.leaves().to_vec();
    for (zone_id, leaf) in leaves.into_iter().enumerate() {
        finalize_zone(tree, leaf, zone_id, inset_range, rng);
    }
}

/// Mirror zone heights across the x = 0 plane.
///
/// Sources are zones with `center.x > epsilon`, targets zones with
/// `center.x < -epsilon`, both in zone order; the i-th target takes the
/// height of the i-th source. Only the height is copied; footprints stay as
/// partitioned. Returns the number of mirrored pairs.
pub fn apply_height_symmetry(tree: &mut PartitionTree, epsilon: f32) -> usize {
    let leaves = tree.leaves().to_vec();
    let sources: Vec<NodeId> = leaves
        .iter()
        .copied()
        .filter(|&id| tree.node(id).center.x > epsilon)
        .collect();
    let targets: Vec<NodeId> = leaves
        .iter()
        .copied()
        .filter(|&id| tree.node(id).center.x < -epsilon)
        .collect();

    let pairs = sources.len().min(targets.len());
    for (&source, &target) in sources.iter().zip(targets.iter()) {
        let height = tree.node(source).height_offset;
        tree.node_mut(source).is_mirrored = true;

        let node = tree.node_mut(target);
        node.height_offset = height;
        node.center.y = height;
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::generation::bsp::build_partition_tree;
    use crate::config::PartitionSettings;
    use crate::geometry::Rect;

    fn finalized(seed: u64) -> PartitionTree {
        let mut rng = ArenaRng::new(seed);
        let mut tree = build_partition_tree(
            Rect::new(-60.0, -60.0, 60.0, 60.0),
            24.0,
            18.0,
            &PartitionSettings::default(),
            &mut rng,
        );
        finalize_zones(&mut tree, [0.75, 0.90], &mut rng);
        tree
    }

    #[test]
    fn test_platform_rect_contained_and_inset() {
        for seed in 1..30 {
            let tree = finalized(seed);
            for zone in tree.zones() {
                let platform = zone.platform_rect.unwrap();
                assert!(zone.bounds.contains_rect(&platform, 1e-4));
                let share = platform.width() / zone.bounds.width();
                assert!((0.75 - 1e-4..=0.90 + 1e-4).contains(&share), "share {}", share);
                let share_z = platform.depth() / zone.bounds.depth();
                assert!((share - share_z).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_zone_ids_follow_leaf_order() {
        let tree = finalized(8);
        for (i, zone) in tree.zones().enumerate() {
            assert_eq!(zone.zone_id, Some(i));
            assert_eq!(zone.center.y, zone.height_offset);
            assert!((zone.center_xz() - zone.bounds.center()).length() < 1e-4);
        }
        for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
            assert_eq!(node.zone_id, None);
            assert!(node.platform_rect.is_none());
        }
    }

    #[test]
    fn test_symmetry_copies_heights_only() {
        let mut tree = finalized(21);
        let before = tree.clone();
        let pairs = apply_height_symmetry(&mut tree, 0.5);

        let sources: Vec<_> = before.zones().filter(|z| z.center.x > 0.5).collect();
        let targets: Vec<_> = tree.zones().filter(|z| z.center.x < -0.5).collect();
        assert_eq!(pairs, sources.len().min(targets.len()));

        for (source, target) in sources.iter().zip(targets.iter()) {
            assert_eq!(target.height_offset, source.height_offset);
            assert_eq!(target.center.y, source.height_offset);
        }
        // Footprints are left as partitioned
        for (a, b) in before.zones().zip(tree.zones()) {
            assert_eq!(a.bounds, b.bounds);
            assert_eq!(a.platform_rect, b.platform_rect);
        }
    }

    #[test]
    fn test_symmetry_leaves_axis_zones_untouched() {
        let mut tree = finalized(4);
        // Park the first zone on the mirror axis
        let first = tree.leaves()[0];
        tree.node_mut(first).center.x = 0.0;
        tree.node_mut(first).height_offset = 123.0;
        tree.node_mut(first).center.y = 123.0;

        apply_height_symmetry(&mut tree, 0.5);
        assert_eq!(tree.node(first).height_offset, 123.0);
        assert!(!tree.node(first).is_mirrored);
    }
}
