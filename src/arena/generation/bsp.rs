//! Binary Space Partitioning (BSP) of the arena footprint into zones
//!
//! Breadth-first splitting driven by a work queue: nodes are split until the
//! drawn target leaf count is reached, the iteration cap runs out, or no
//! node can be split any further.

use std::collections::VecDeque;

use crate::arena::types::{NodeId, PartitionNode, PartitionTree};
use crate::config::PartitionSettings;
use crate::geometry::Rect;
use crate::seeds::ArenaRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitAxis {
    /// Cut across x (children side by side along x)
    X,
    /// Cut across z
    Z,
}

/// Build the partition tree for `root_bounds`.
pub fn build_partition_tree(
    root_bounds: Rect,
    min_zone_size: f32,
    max_height_variation: f32,
    settings: &PartitionSettings,
    rng: &mut ArenaRng,
) -> PartitionTree {
    let [min_leaves, max_leaves] = settings.zone_count_range;
    let target_leaf_count = rng.range_inclusive(min_leaves, max_leaves);
    let max_step = settings.height_step_share * max_height_variation;

    let mut nodes = vec![PartitionNode::new(root_bounds, 0.0, 0)];
    let mut leaves: Vec<NodeId> = Vec::new();
    let mut queue: VecDeque<NodeId> = VecDeque::from([0]);
    let mut iterations = 0;

    while leaves.len() + queue.len() < target_leaf_count && iterations < settings.max_iterations {
        let Some(id) = queue.pop_front() else {
            break;
        };
        iterations += 1;

        let bounds = nodes[id].bounds;
        let can_split_x = bounds.width() >= 2.0 * min_zone_size;
        let can_split_z = bounds.depth() >= 2.0 * min_zone_size;
        if !can_split_x && !can_split_z {
            leaves.push(id);
            continue;
        }

        // The coin is always drawn so the sequence does not depend on shape
        let coin = rng.chance(0.5);
        let axis = match (can_split_x, can_split_z) {
            (true, true) => {
                if coin {
                    SplitAxis::X
                } else {
                    SplitAxis::Z
                }
            }
            (true, false) => SplitAxis::X,
            _ => SplitAxis::Z,
        };
        let ratio = rng.uniform(settings.split_ratio_range[0], settings.split_ratio_range[1]);

        let (left_bounds, right_bounds) = split_rect(&bounds, axis, ratio, min_zone_size);

        let parent_height = nodes[id].height_offset;
        let depth = nodes[id].depth + 1;
        let left_height = parent_height + rng.uniform(0.0, max_step);
        let right_height = parent_height + rng.uniform(0.0, max_step);

        let left = nodes.len();
        nodes.push(PartitionNode::new(left_bounds, left_height, depth));
        let right = nodes.len();
        nodes.push(PartitionNode::new(right_bounds, right_height, depth));

        nodes[id].left = Some(left);
        nodes[id].right = Some(right);
        queue.push_back(left);
        queue.push_back(right);
    }

    if leaves.len() + queue.len() < target_leaf_count {
        log::debug!(
            "Partition stopped at {} zones (target {}, {} iterations)",
            leaves.len() + queue.len(),
            target_leaf_count,
            iterations
        );
    }

    leaves.extend(queue.drain(..));

    PartitionTree {
        nodes,
        root: 0,
        leaves,
        target_leaf_count,
        iterations,
    }
}

/// Split `rect` at `ratio` along `axis`, keeping both children at least
/// `min_size` wide on that axis.
fn split_rect(rect: &Rect, axis: SplitAxis, ratio: f32, min_size: f32) -> (Rect, Rect) {
    match axis {
        SplitAxis::X => {
            let offset = (rect.width() * ratio).max(min_size).min(rect.width() - min_size);
            let split_x = rect.min.x + offset;
            (
                Rect::new(rect.min.x, rect.min.y, split_x, rect.max.y),
                Rect::new(split_x, rect.min.y, rect.max.x, rect.max.y),
            )
        }
        SplitAxis::Z => {
            let offset = (rect.depth() * ratio).max(min_size).min(rect.depth() - min_size);
            let split_z = rect.min.y + offset;
            (
                Rect::new(rect.min.x, rect.min.y, rect.max.x, split_z),
                Rect::new(rect.min.x, split_z, rect.max.x, rect.max.y),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Rect {
        Rect::new(-60.0, -60.0, 60.0, 60.0)
    }

    fn build(seed: u64) -> PartitionTree {
        let mut rng = ArenaRng::new(seed);
        build_partition_tree(root(), 24.0, 18.0, &PartitionSettings::default(), &mut rng)
    }

    #[test]
    fn test_leaves_tile_root_exactly() {
        for seed in 1..40 {
            let tree = build(seed);
            let leaves: Vec<Rect> = tree.leaves().iter().map(|&id| tree.node(id).bounds).collect();

            let area: f32 = leaves.iter().map(|r| r.area()).sum();
            assert!((area - root().area()).abs() < 1e-2, "seed {}: area {}", seed, area);

            for (i, a) in leaves.iter().enumerate() {
                assert!(root().contains_rect(a, 1e-4));
                for b in &leaves[i + 1..] {
                    assert!(a.overlap_area(b) < 1e-4, "seed {}: leaves overlap", seed);
                }
            }
        }
    }

    #[test]
    fn test_children_tile_parent() {
        let tree = build(7);
        for node in tree.nodes() {
            if let (Some(l), Some(r)) = (node.left, node.right) {
                let (l, r) = (tree.node(l), tree.node(r));
                assert!((l.bounds.area() + r.bounds.area() - node.bounds.area()).abs() < 1e-3);
                assert!(node.bounds.contains_rect(&l.bounds, 1e-4));
                assert!(node.bounds.contains_rect(&r.bounds, 1e-4));
                assert!(l.height_offset >= node.height_offset);
                assert!(r.height_offset >= node.height_offset);
            } else {
                assert!(node.left.is_none() && node.right.is_none());
            }
        }
    }

    #[test]
    fn test_every_node_is_internal_or_leaf_once() {
        let tree = build(11);
        let mut seen = vec![0; tree.nodes().len()];
        for &id in tree.leaves() {
            seen[id] += 1;
            assert!(tree.node(id).is_leaf());
        }
        for (id, node) in tree.nodes().iter().enumerate() {
            if node.is_leaf() {
                assert_eq!(seen[id], 1, "leaf {} listed {} times", id, seen[id]);
            } else {
                assert_eq!(seen[id], 0);
            }
        }
    }

    #[test]
    fn test_minimum_size_respected() {
        for seed in 1..40 {
            let tree = build(seed);
            for zone in tree.zones() {
                assert!(zone.bounds.width() >= 24.0 - 1e-3, "seed {}", seed);
                assert!(zone.bounds.depth() >= 24.0 - 1e-3, "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_leaf_count_reaches_target() {
        for seed in 1..40 {
            let tree = build(seed);
            assert!((8..=16).contains(&tree.target_leaf_count));
            assert_eq!(tree.zone_count(), tree.target_leaf_count, "seed {}", seed);
            assert!(tree.iterations <= 50);
        }
    }

    #[test]
    fn test_unsplittable_root_is_single_leaf() {
        let mut rng = ArenaRng::new(3);
        let tree = build_partition_tree(
            Rect::new(0.0, 0.0, 30.0, 30.0),
            24.0,
            10.0,
            &PartitionSettings::default(),
            &mut rng,
        );
        assert_eq!(tree.zone_count(), 1);
        assert_eq!(tree.root().bounds, Rect::new(0.0, 0.0, 30.0, 30.0));
    }

    #[test]
    fn test_iteration_cap_is_honoured() {
        let mut settings = PartitionSettings::default();
        settings.max_iterations = 2;
        let mut rng = ArenaRng::new(5);
        let tree = build_partition_tree(root(), 24.0, 18.0, &settings, &mut rng);
        assert_eq!(tree.iterations, 2);
        assert_eq!(tree.zone_count(), 3);
    }

    #[test]
    fn test_same_seed_same_tree() {
        assert_eq!(build(42), build(42));
    }
}
