//! Arena data types
//!
//! The partition tree and its zones, rails, and the gameplay entities placed
//! on top of the geometry.

use glam::{Vec2, Vec3};
use serde::Serialize;

use crate::geometry::mesh::MeshData;
use crate::geometry::{Collider, Rect};

/// Index of a node inside its [`PartitionTree`]
pub type NodeId = usize;

/// A node of the binary space partition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartitionNode {
    /// Footprint on the ground plane
    pub bounds: Rect,
    /// Parent's offset plus this node's own step
    pub height_offset: f32,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub depth: u32,
    /// Assigned to leaves by zone finalization
    pub zone_id: Option<usize>,
    /// Buildable inset of `bounds`, leaves only
    pub platform_rect: Option<Rect>,
    pub center: Vec3,
    /// Set on zones whose height was copied onto their mirror partner
    pub is_mirrored: bool,
}

impl PartitionNode {
    pub fn new(bounds: Rect, height_offset: f32, depth: u32) -> Self {
        let c = bounds.center();
        Self {
            bounds,
            height_offset,
            left: None,
            right: None,
            depth,
            zone_id: None,
            platform_rect: None,
            center: Vec3::new(c.x, height_offset, c.y),
            is_mirrored: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Platform footprint, falling back to the raw bounds before finalization.
    pub fn platform(&self) -> Rect {
        self.platform_rect.unwrap_or(self.bounds)
    }

    /// Ground-plane position of the center.
    pub fn center_xz(&self) -> Vec2 {
        Vec2::new(self.center.x, self.center.z)
    }

    /// Height of the walkable top surface.
    pub fn top(&self) -> f32 {
        self.height_offset
    }
}

/// Partition tree owning all of its nodes, plus the ordered leaf list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartitionTree {
    pub(crate) nodes: Vec<PartitionNode>,
    pub(crate) root: NodeId,
    pub(crate) leaves: Vec<NodeId>,
    /// Leaf count the builder aimed for
    pub target_leaf_count: usize,
    /// Split iterations actually used
    pub iterations: usize,
}

impl PartitionTree {
    pub fn root(&self) -> &PartitionNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: NodeId) -> &PartitionNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PartitionNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[PartitionNode] {
        &self.nodes
    }

    /// Leaf node ids, in the order the builder produced them.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn zone_count(&self) -> usize {
        self.leaves.len()
    }

    /// Zone by id. Zone ids follow leaf order.
    pub fn zone(&self, zone_id: usize) -> &PartitionNode {
        &self.nodes[self.leaves[zone_id]]
    }

    /// All zones in id order.
    pub fn zones(&self) -> impl Iterator<Item = &PartitionNode> + '_ {
        self.leaves.iter().map(move |&id| &self.nodes[id])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RailKind {
    Grind,
    Spiral,
    Branch,
    Loop,
}

impl RailKind {
    pub fn name(&self) -> &'static str {
        match self {
            RailKind::Grind => "grind",
            RailKind::Spiral => "spiral",
            RailKind::Branch => "branch",
            RailKind::Loop => "loop",
        }
    }
}

/// Bézier handles of one control point, relative to the point
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RailHandle {
    pub inbound: Vec3,
    pub outbound: Vec3,
}

/// Extruded tube owned by a rail
#[derive(Clone, Debug, PartialEq)]
pub struct RailTube {
    pub mesh: MeshData,
    pub collider: Collider,
}

/// A movement rail: control points, handles and (when long enough) a tube.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rail {
    pub kind: RailKind,
    pub control_points: Vec<Vec3>,
    pub handles: Vec<RailHandle>,
    /// Zones the rail touches (referenced, not owned)
    pub zones: Vec<usize>,
    /// Arc length of the Bézier path
    pub length: f32,
    /// Ring samples the tube was (or would be) built with
    pub sample_count: usize,
    #[serde(skip)]
    pub tube: Option<RailTube>,
}

impl Rail {
    pub fn has_tube(&self) -> bool {
        self.tube.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.tube.as_ref().map_or(0, |t| t.mesh.triangle_count())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PowerUpKind {
    Health,
    Shield,
    Speed,
    Damage,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Health,
        PowerUpKind::Shield,
        PowerUpKind::Speed,
        PowerUpKind::Damage,
    ];

    pub fn respawn_secs(&self) -> f32 {
        match self {
            PowerUpKind::Health => 20.0,
            PowerUpKind::Shield => 30.0,
            PowerUpKind::Speed => 25.0,
            PowerUpKind::Damage => 45.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HazardKind {
    SpikeTrap,
    LaserGrid,
    Mine,
}

impl HazardKind {
    pub const ALL: [HazardKind; 3] = [HazardKind::SpikeTrap, HazardKind::LaserGrid, HazardKind::Mine];

    /// Radius relative to the smaller side of the host platform.
    pub fn radius_share(&self) -> f32 {
        match self {
            HazardKind::SpikeTrap => 0.15,
            HazardKind::LaserGrid => 0.25,
            HazardKind::Mine => 0.08,
        }
    }
}

/// Entity kind together with its type-specific data
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum EntityKind {
    Spawn { facing: Vec3 },
    PowerUp { power_up: PowerUpKind, respawn_secs: f32 },
    Spring { launch_velocity: Vec3, target_zone: usize },
    Hazard { hazard: HazardKind, radius: f32 },
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Spawn { .. } => "spawn",
            EntityKind::PowerUp { .. } => "power_up",
            EntityKind::Spring { .. } => "spring",
            EntityKind::Hazard { .. } => "hazard",
        }
    }
}

/// Gameplay anchor produced by the entity placer
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlacedEntity {
    pub position: Vec3,
    pub zone: usize,
    pub kind: EntityKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_leaf_with_center() {
        let node = PartitionNode::new(Rect::new(0.0, 0.0, 10.0, 20.0), 3.0, 0);
        assert!(node.is_leaf());
        assert_eq!(node.center, Vec3::new(5.0, 3.0, 10.0));
        assert_eq!(node.zone_id, None);
        assert_eq!(node.platform(), node.bounds);
    }
}
