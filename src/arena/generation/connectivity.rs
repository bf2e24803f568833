//! Zone connectivity graph
//!
//! Zones whose centers lie within the connection distance of each other are
//! linked by an undirected edge weighted with that distance. The graph
//! drives spawn spreading and the final reachability check.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use serde::Serialize;

use crate::arena::types::PartitionTree;

/// Undirected edge between two zones
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GraphEdge {
    pub a: usize,
    pub b: usize,
    pub length: f32,
}

/// Node for the Dijkstra priority queue
#[derive(Clone, Copy, Debug)]
struct PathNode {
    zone: usize,
    cost: f32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.zone == other.zone
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, lower zone id first on ties
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.zone.cmp(&self.zone))
    }
}

/// Result of a reachability check from one origin zone
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReachabilityReport {
    pub origin: usize,
    /// Zones reachable from the origin, the origin included
    pub reachable_count: usize,
    /// Zones that cannot be reached, in id order
    pub unreachable: Vec<usize>,
}

impl ReachabilityReport {
    pub fn is_fully_connected(&self) -> bool {
        self.unreachable.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectivityGraph {
    positions: Vec<Vec3>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    adjacency: Vec<Vec<(usize, f32)>>,
    threshold: f32,
}

impl ConnectivityGraph {
    /// Link every pair of positions closer than `threshold`.
    pub fn build(positions: &[Vec3], threshold: f32) -> Self {
        let n = positions.len();
        let mut edges = Vec::new();
        let mut adjacency = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let length = positions[i].distance(positions[j]);
                if length < threshold {
                    edges.push(GraphEdge { a: i, b: j, length });
                    adjacency[i].push((j, length));
                    adjacency[j].push((i, length));
                }
            }
        }
        Self {
            positions: positions.to_vec(),
            edges,
            adjacency,
            threshold,
        }
    }

    /// Graph over the zone centers of a finalized tree.
    pub fn from_tree(tree: &PartitionTree, threshold: f32) -> Self {
        let centers: Vec<Vec3> = tree.zones().map(|z| z.center).collect();
        Self::build(&centers, threshold)
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn position(&self, zone: usize) -> Vec3 {
        self.positions[zone]
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Neighbours of `zone` with the edge length, in id order.
    pub fn neighbors(&self, zone: usize) -> &[(usize, f32)] {
        &self.adjacency[zone]
    }

    pub fn degree(&self, zone: usize) -> usize {
        self.neighbors(zone).len()
    }

    /// Shortest path length from `origin` to every zone (`None` if unreachable).
    pub fn shortest_distances(&self, origin: usize) -> Vec<Option<f32>> {
        self.dijkstra(origin).0
    }

    /// Zone sequence of a shortest path from `from` to `to`, both included.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        if from >= self.node_count() || to >= self.node_count() {
            return None;
        }
        let (dist, came_from) = self.dijkstra(from);
        dist[to]?;

        let mut path = vec![to];
        let mut current = to;
        while let Some(prev) = came_from[current] {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }

    fn dijkstra(&self, origin: usize) -> (Vec<Option<f32>>, Vec<Option<usize>>) {
        let n = self.node_count();
        let mut dist: Vec<Option<f32>> = vec![None; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        if origin >= n {
            return (dist, came_from);
        }

        let mut pq = BinaryHeap::new();
        dist[origin] = Some(0.0);
        pq.push(PathNode { zone: origin, cost: 0.0 });

        while let Some(PathNode { zone, cost }) = pq.pop() {
            // Skip stale queue entries
            if dist[zone].is_some_and(|best| cost > best) {
                continue;
            }
            for &(next, length) in self.neighbors(zone) {
                let new_cost = cost + length;
                if dist[next].map_or(true, |current| new_cost < current) {
                    dist[next] = Some(new_cost);
                    came_from[next] = Some(zone);
                    pq.push(PathNode { zone: next, cost: new_cost });
                }
            }
        }
        (dist, came_from)
    }

    /// Breadth-first reachability from `origin`.
    pub fn validate_reachable(&self, origin: usize) -> ReachabilityReport {
        let n = self.node_count();
        let mut visited = vec![false; n];
        if origin < n {
            let mut queue = std::collections::VecDeque::from([origin]);
            visited[origin] = true;
            while let Some(zone) = queue.pop_front() {
                for &(next, _) in self.neighbors(zone) {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        let unreachable: Vec<usize> = (0..n).filter(|&z| !visited[z]).collect();
        if !unreachable.is_empty() {
            log::warn!(
                "{} of {} zones are unreachable from zone {}: {:?}",
                unreachable.len(),
                n,
                origin,
                unreachable
            );
        }
        ReachabilityReport {
            origin,
            reachable_count: n - unreachable.len(),
            unreachable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(spacing: f32, count: usize) -> Vec<Vec3> {
        (0..count).map(|i| Vec3::new(i as f32 * spacing, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_edges_follow_threshold() {
        let graph = ConnectivityGraph::build(&line(10.0, 4), 15.0);
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.neighbors(0), &[(1, 10.0)]);
        assert_eq!(graph.neighbors(1), &[(0, 10.0), (2, 10.0)]);
        assert_eq!(graph.threshold(), 15.0);
        assert_eq!(graph.position(3), Vec3::new(30.0, 0.0, 0.0));
        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.degree(1), 2);
        for e in graph.edges() {
            assert!(e.a < e.b);
            assert!(e.length < 15.0);
        }
    }

    #[test]
    fn test_height_counts_toward_distance() {
        let positions = vec![Vec3::ZERO, Vec3::new(9.0, 9.0, 0.0)];
        assert!(ConnectivityGraph::build(&positions, 10.0).edges().is_empty());
        assert_eq!(ConnectivityGraph::build(&positions, 13.0).edges().len(), 1);
    }

    #[test]
    fn test_isolated_zone_is_reported() {
        let mut positions = line(10.0, 4);
        positions.push(Vec3::new(500.0, 0.0, 500.0));
        let graph = ConnectivityGraph::build(&positions, 15.0);
        let report = graph.validate_reachable(0);
        assert_eq!(report.reachable_count, 4);
        assert_eq!(report.unreachable, vec![4]);
        assert!(!report.is_fully_connected());
        assert_eq!(graph.shortest_distances(0)[4], None);
        assert_eq!(graph.shortest_path(0, 4), None);
    }

    #[test]
    fn test_shortest_path_prefers_short_hops() {
        // Square with one diagonal: 0-1-2 around is 20, 0-2 directly is ~14.1
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        ];
        let graph = ConnectivityGraph::build(&positions, 15.0);
        assert_eq!(graph.shortest_path(0, 2), Some(vec![0, 2]));
        let d = graph.shortest_distances(0);
        assert_eq!(d[0], Some(0.0));
        assert!((d[2].unwrap() - 200.0_f32.sqrt()).abs() < 1e-4);

        let chain = ConnectivityGraph::build(&line(10.0, 5), 12.0);
        assert_eq!(chain.shortest_path(0, 4), Some(vec![0, 1, 2, 3, 4]));
        assert_eq!(chain.shortest_path(2, 2), Some(vec![2]));
        assert!((chain.shortest_distances(4)[0].unwrap() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ConnectivityGraph::build(&[], 10.0);
        let report = graph.validate_reachable(0);
        assert_eq!(report.reachable_count, 0);
        assert!(report.unreachable.is_empty());
    }
}
