//! ASCII rendering of arena layouts
//!
//! Each character cell samples the world at its center, from the ground up:
//! gap, zone, platform, obstacle, rail, entity. Platforms show their height
//! band as a digit.

use glam::Vec2;

use crate::arena::types::EntityKind;
use crate::arena::Arena;
use crate::geometry::BoundKind;

/// Character for a platform at the given relative height.
pub fn height_char(t: f32) -> char {
    const BANDS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
    BANDS[((t.clamp(0.0, 1.0) * 9.0).round() as usize).min(9)]
}

pub fn entity_char(kind: &EntityKind) -> char {
    match kind {
        EntityKind::Spawn { .. } => 'S',
        EntityKind::PowerUp { .. } => 'P',
        EntityKind::Spring { .. } => 'J',
        EntityKind::Hazard { .. } => 'X',
    }
}

/// Render the arena as `columns` × `columns` characters.
pub fn render_ascii_layout(arena: &Arena, columns: usize) -> String {
    let columns = columns.max(1);
    let footprint = arena.scale.footprint;
    let half = footprint * 0.5;
    let cell = footprint / columns as f32;
    let world = |col: usize, row: usize| Vec2::new(-half + (col as f32 + 0.5) * cell, -half + (row as f32 + 0.5) * cell);
    let to_cell = |x: f32, z: f32| -> Option<(usize, usize)> {
        let col = ((x + half) / cell).floor();
        let row = ((z + half) / cell).floor();
        (col >= 0.0 && row >= 0.0 && (col as usize) < columns && (row as usize) < columns)
            .then_some((col as usize, row as usize))
    };

    let tops: Vec<f32> = arena.tree.zones().map(|z| z.top()).collect();
    let lo = tops.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = tops.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = (hi - lo).max(1e-3);

    let mut grid = vec![vec![' '; columns]; columns];
    for (row, line) in grid.iter_mut().enumerate() {
        for (col, ch) in line.iter_mut().enumerate() {
            let p = world(col, row);
            if let Some(zone) = arena.tree.zones().find(|z| z.bounds.contains_point(p, 0.0)) {
                *ch = if zone.platform().contains_point(p, 0.0) {
                    height_char((zone.top() - lo) / span)
                } else {
                    '.'
                };
            }
            if arena
                .bounds
                .iter()
                .any(|b| b.kind == BoundKind::Obstacle && b.footprint().contains_point(p, 0.0))
            {
                *ch = '#';
            }
        }
    }

    for rail in &arena.rails {
        for point in &rail.control_points {
            if let Some((col, row)) = to_cell(point.x, point.z) {
                grid[row][col] = '~';
            }
        }
    }
    for entity in &arena.entities {
        if let Some((col, row)) = to_cell(entity.position.x, entity.position.z) {
            grid[row][col] = entity_char(&entity.kind);
        }
    }

    let mut result = String::with_capacity((columns + 1) * columns);
    for line in grid {
        result.extend(line);
        result.push('\n');
    }
    result
}

/// Legend for [`render_ascii_layout`]
pub fn layout_legend() -> String {
    [
        "0-9  platform (height band, low to high)",
        ".    zone gap",
        "#    obstacle",
        "~    rail control point",
        "S    spawn",
        "P    power-up",
        "J    spring",
        "X    hazard",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::generate_arena;
    use crate::config::ArenaConfig;
    use crate::geometry::sink::NullSink;

    #[test]
    fn test_layout_dimensions_and_markers() {
        let arena = generate_arena(&ArenaConfig::new(42, 120.0, 2), &mut NullSink).unwrap();
        let text = render_ascii_layout(&arena, 120);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 120);
        assert!(lines.iter().all(|l| l.chars().count() == 120));
        assert!(text.contains('S'));
        assert!(text.contains('.'));
    }

    #[test]
    fn test_height_bands() {
        assert_eq!(height_char(0.0), '0');
        assert_eq!(height_char(1.0), '9');
        assert_eq!(height_char(-3.0), '0');
        assert_eq!(height_char(0.5), '5');
    }
}
