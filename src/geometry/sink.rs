//! Boundary between the generator and whatever consumes its geometry
//!
//! A game engine implements [`GeometrySink`] to turn nodes into scene
//! objects; the crate ships an in-memory collector, an OBJ writer and a
//! sink that discards everything.

use crate::config::NavBakeSettings;

use super::{GeometryNode, NodeRole};

/// Receives geometry as the pipeline produces it.
pub trait GeometrySink {
    /// Called once per emitted node, in generation order.
    fn add_node(&mut self, node: &GeometryNode);

    /// Called once after every phase has run. Material application and
    /// navigation-mesh baking are triggered from here.
    fn finish(&mut self, _nav: &NavBakeSettings) {}
}

/// Discards all geometry (headless generation, e.g. a dedicated server).
#[derive(Debug, Default)]
pub struct NullSink;

impl GeometrySink for NullSink {
    fn add_node(&mut self, _node: &GeometryNode) {}
}

/// Keeps every node in memory.
#[derive(Debug, Default)]
pub struct SceneCollector {
    pub nodes: Vec<GeometryNode>,
    pub finished: bool,
    pub nav_bake: Option<NavBakeSettings>,
}

impl SceneCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = &GeometryNode> {
        self.nodes.iter().filter(move |n| n.role == role)
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.mesh.triangle_count()).sum()
    }
}

impl GeometrySink for SceneCollector {
    fn add_node(&mut self, node: &GeometryNode) {
        self.nodes.push(node.clone());
    }

    fn finish(&mut self, nav: &NavBakeSettings) {
        self.finished = true;
        self.nav_bake = Some(nav.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use glam::Vec3;

    #[test]
    fn test_collector_counts_roles() {
        let mut sink = SceneCollector::new();
        for (i, role) in [NodeRole::Platform, NodeRole::Rail, NodeRole::Platform].into_iter().enumerate() {
            sink.add_node(&GeometryNode {
                name: format!("node_{}", i),
                role,
                mesh: MeshData::cuboid(Vec3::ZERO, Vec3::ONE),
                collider: None,
            });
        }
        sink.finish(&NavBakeSettings::default());
        assert!(sink.finished);
        assert_eq!(sink.nodes_with_role(NodeRole::Platform).count(), 2);
        assert_eq!(sink.triangle_count(), 36);
    }
}
