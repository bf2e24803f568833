//! Engine-independent geometry types
//!
//! Everything the pipeline builds is expressed with these plain types and
//! handed to a [`sink::GeometrySink`]; the sink decides how (and whether)
//! it becomes scene objects.

pub mod mesh;
pub mod obj;
pub mod sink;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use mesh::MeshData;
pub use sink::{GeometrySink, NullSink, SceneCollector};

/// Axis-aligned rectangle on the ground plane. `x` maps to world x and
/// `y` to world z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_z),
            max: Vec2::new(max_x, max_z),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn depth(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width() * self.depth()
    }

    /// Point at parametric coordinates `(u, v)` in `[0, 1]²`.
    pub fn point_at(&self, u: f32, v: f32) -> Vec2 {
        self.min + self.size() * Vec2::new(u, v)
    }

    /// Rectangle scaled by `factor` on both axes around the same center.
    pub fn inset(&self, factor: f32) -> Self {
        Self::from_center(self.center(), self.size() * factor)
    }

    pub fn contains_point(&self, p: Vec2, tolerance: f32) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }

    pub fn contains_rect(&self, other: &Rect, tolerance: f32) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
    }

    /// Area of the intersection with `other` (0 when they only touch).
    pub fn overlap_area(&self, other: &Rect) -> f32 {
        let w = (self.max.x.min(other.max.x) - self.min.x.max(other.min.x)).max(0.0);
        let d = (self.max.y.min(other.max.y) - self.min.y.max(other.min.y)).max(0.0);
        w * d
    }

    /// Interior overlap after growing both rectangles by `margin`.
    pub fn overlaps(&self, other: &Rect, margin: f32) -> bool {
        self.min.x - margin < other.max.x
            && other.min.x - margin < self.max.x
            && self.min.y - margin < other.max.y
            && other.min.y - margin < self.max.y
    }
}

/// What an entry of the bounds list stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    Platform,
    Obstacle,
    SpringPad,
}

/// Axis-aligned volume already placed in the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryBound {
    /// Center of the volume
    pub position: Vec3,
    /// Full extents
    pub size: Vec3,
    pub kind: BoundKind,
}

impl GeometryBound {
    /// Volume spanning `rect` horizontally and `[bottom, top]` vertically.
    pub fn from_rect(rect: &Rect, bottom: f32, top: f32, kind: BoundKind) -> Self {
        let c = rect.center();
        Self {
            position: Vec3::new(c.x, (bottom + top) * 0.5, c.y),
            size: Vec3::new(rect.width(), top - bottom, rect.depth()),
            kind,
        }
    }

    pub fn top(&self) -> f32 {
        self.position.y + self.size.y * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.position.y - self.size.y * 0.5
    }

    /// Horizontal footprint as a ground-plane rectangle.
    pub fn footprint(&self) -> Rect {
        Rect::from_center(
            Vec2::new(self.position.x, self.position.z),
            Vec2::new(self.size.x, self.size.z),
        )
    }

    /// Whether the footprint contains the x/z of `point` within `tolerance`.
    pub fn contains_xz(&self, point: Vec3, tolerance: f32) -> bool {
        (point.x - self.position.x).abs() <= self.size.x * 0.5 + tolerance
            && (point.z - self.position.z).abs() <= self.size.z * 0.5 + tolerance
    }
}

/// Collision shape attached to a geometry node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Box { center: Vec3, half_extents: Vec3 },
    /// Chain of capsules through consecutive ring centers
    Tube { centers: Vec<Vec3>, radius: f32 },
}

impl Collider {
    pub fn box_from_bound(bound: &GeometryBound) -> Self {
        Collider::Box {
            center: bound.position,
            half_extents: bound.size * 0.5,
        }
    }
}

/// What a geometry node represents in the arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Platform,
    Obstacle,
    Rail,
    Loop,
    SpringPad,
}

/// A renderable mesh with an optional collider, ready for a sink
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryNode {
    pub name: String,
    pub role: NodeRole,
    pub mesh: MeshData,
    pub collider: Option<Collider>,
}
