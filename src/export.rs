//! Diagnostic exports: JSON summary and top-down PNG layout maps

use std::path::Path;

use glam::{Vec2, Vec3};
use image::{ImageBuffer, Rgb, RgbImage};
use serde::Serialize;

use crate::arena::generation::connectivity::{GraphEdge, ReachabilityReport};
use crate::arena::types::{EntityKind, PlacedEntity, Rail, RailKind};
use crate::arena::{Arena, GenerationStats};
use crate::error::ArenaError;
use crate::geometry::{BoundKind, GeometryBound, Rect};

const BACKGROUND: [u8; 3] = [24, 24, 30];
const ZONE_FILL: [u8; 3] = [48, 48, 58];
const OBSTACLE_COLOR: [u8; 3] = [70, 60, 50];
const EDGE_COLOR: [u8; 3] = [110, 110, 125];
const RAIL_COLOR: [u8; 3] = [235, 235, 245];
const LOOP_COLOR: [u8; 3] = [190, 120, 240];

#[derive(Serialize)]
struct ZoneSummary {
    id: usize,
    bounds: Rect,
    platform: Rect,
    center: Vec3,
    mirrored: bool,
}

/// Everything a client or a test harness needs to inspect a layout
#[derive(Serialize)]
pub struct ArenaSummary<'a> {
    seed: u64,
    footprint: f32,
    complexity: u8,
    fingerprint: u64,
    zones: Vec<ZoneSummary>,
    rails: &'a [Rail],
    edges: &'a [GraphEdge],
    bounds: &'a [GeometryBound],
    spawn_points: &'a [Vec3],
    entities: &'a [PlacedEntity],
    reachability: &'a ReachabilityReport,
    stats: &'a GenerationStats,
}

impl<'a> ArenaSummary<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        let zones = arena
            .tree
            .zones()
            .enumerate()
            .map(|(id, zone)| ZoneSummary {
                id,
                bounds: zone.bounds,
                platform: zone.platform(),
                center: zone.center,
                mirrored: zone.is_mirrored,
            })
            .collect();
        Self {
            seed: arena.seed,
            footprint: arena.scale.footprint,
            complexity: arena.config.complexity,
            fingerprint: arena.layout_fingerprint(),
            zones,
            rails: &arena.rails,
            edges: arena.graph.edges(),
            bounds: &arena.bounds,
            spawn_points: &arena.spawn_points,
            entities: &arena.entities,
            reachability: &arena.reachability,
            stats: &arena.stats,
        }
    }
}

/// Serialize the arena summary as pretty JSON.
pub fn summary_json(arena: &Arena) -> Result<String, ArenaError> {
    Ok(serde_json::to_string_pretty(&ArenaSummary::new(arena))?)
}

/// Write the arena summary to a JSON file.
pub fn export_summary_json(arena: &Arena, path: impl AsRef<Path>) -> Result<(), ArenaError> {
    std::fs::write(path, summary_json(arena)?)?;
    Ok(())
}

/// Spectral colormap (matplotlib style): dark blue -> green -> yellow -> red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 6] = [
        [0.37, 0.31, 0.64], // Dark blue (low)
        [0.20, 0.53, 0.74], // Blue
        [0.40, 0.76, 0.65], // Teal
        [0.90, 0.96, 0.60], // Yellow-green
        [0.99, 0.68, 0.38], // Orange
        [0.84, 0.24, 0.31], // Red (high)
    ];

    let t_scaled = t.clamp(0.0, 1.0) * 5.0;
    let idx = (t_scaled as usize).min(4);
    let frac = t_scaled - idx as f32;
    let (c1, c2) = (colors[idx], colors[idx + 1]);

    [
        ((c1[0] + (c2[0] - c1[0]) * frac) * 255.0) as u8,
        ((c1[1] + (c2[1] - c1[1]) * frac) * 255.0) as u8,
        ((c1[2] + (c2[2] - c1[2]) * frac) * 255.0) as u8,
    ]
}

fn entity_color(kind: &EntityKind) -> [u8; 3] {
    match kind {
        EntityKind::Spawn { .. } => [60, 220, 90],
        EntityKind::PowerUp { .. } => [70, 150, 255],
        EntityKind::Spring { .. } => [250, 220, 60],
        EntityKind::Hazard { .. } => [235, 60, 50],
    }
}

/// Maps world x/z onto image pixels
struct Canvas {
    img: RgbImage,
    half: f32,
    pixels_per_unit: f32,
}

impl Canvas {
    fn new(footprint: f32, pixels_per_unit: f32) -> Self {
        let side = ((footprint * pixels_per_unit).ceil() as u32).max(1);
        Self {
            img: ImageBuffer::from_pixel(side, side, Rgb(BACKGROUND)),
            half: footprint * 0.5,
            pixels_per_unit,
        }
    }

    fn to_pixel(&self, p: Vec2) -> (i64, i64) {
        (
            ((p.x + self.half) * self.pixels_per_unit).floor() as i64,
            ((p.y + self.half) * self.pixels_per_unit).floor() as i64,
        )
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    fn fill_rect(&mut self, rect: &Rect, color: [u8; 3]) {
        let (x0, y0) = self.to_pixel(rect.min);
        let (x1, y1) = self.to_pixel(rect.max);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, color);
            }
        }
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: [u8; 3]) {
        let (x0, y0) = self.to_pixel(a);
        let (x1, y1) = self.to_pixel(b);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = x0 as f64 + (x1 - x0) as f64 * t;
            let y = y0 as f64 + (y1 - y0) as f64 * t;
            self.put(x.round() as i64, y.round() as i64, color);
        }
    }

    fn marker(&mut self, p: Vec2, radius: i64, color: [u8; 3]) {
        let (cx, cy) = self.to_pixel(p);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                self.put(cx + dx, cy + dy, color);
            }
        }
    }
}

/// Render the arena top-down. Platforms are colored by height, graph edges
/// drawn in grey, rails in white (loops in purple) and entities as squares.
pub fn render_layout(arena: &Arena, pixels_per_unit: f32) -> RgbImage {
    let mut canvas = Canvas::new(arena.scale.footprint, pixels_per_unit);

    let tops: Vec<f32> = arena.tree.zones().map(|z| z.top()).collect();
    let lo = tops.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = tops.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = (hi - lo).max(1e-3);

    for zone in arena.tree.zones() {
        canvas.fill_rect(&zone.bounds, ZONE_FILL);
        canvas.fill_rect(&zone.platform(), spectral_colormap((zone.top() - lo) / span));
    }
    for bound in arena.bounds.iter().filter(|b| b.kind == BoundKind::Obstacle) {
        canvas.fill_rect(&bound.footprint(), OBSTACLE_COLOR);
    }

    for edge in arena.graph.edges() {
        let a = arena.graph.position(edge.a);
        let b = arena.graph.position(edge.b);
        canvas.line(Vec2::new(a.x, a.z), Vec2::new(b.x, b.z), EDGE_COLOR);
    }

    for rail in &arena.rails {
        let color = if rail.kind == RailKind::Loop {
            LOOP_COLOR
        } else {
            RAIL_COLOR
        };
        for pair in rail.control_points.windows(2) {
            canvas.line(Vec2::new(pair[0].x, pair[0].z), Vec2::new(pair[1].x, pair[1].z), color);
        }
    }

    let radius = (pixels_per_unit * 0.8).round().max(1.0) as i64;
    // Spawns last so nothing hides them
    let (spawns, others): (Vec<&PlacedEntity>, Vec<&PlacedEntity>) = arena
        .entities
        .iter()
        .partition(|e| matches!(e.kind, EntityKind::Spawn { .. }));
    for entity in others.into_iter().chain(spawns) {
        canvas.marker(
            Vec2::new(entity.position.x, entity.position.z),
            radius,
            entity_color(&entity.kind),
        );
    }

    canvas.img
}

/// Write the layout map as a PNG.
pub fn export_layout_png(arena: &Arena, path: impl AsRef<Path>, pixels_per_unit: f32) -> Result<(), ArenaError> {
    render_layout(arena, pixels_per_unit).save(path)?;
    Ok(())
}

/// Layout maps side by side, each with a caption strip beneath it.
pub fn render_layout_strip(arenas: &[Arena], pixels_per_unit: f32) -> RgbImage {
    const CAPTION: u32 = 14;
    const GAP: u32 = 4;

    let panels: Vec<RgbImage> = arenas.iter().map(|a| render_layout(a, pixels_per_unit)).collect();
    let width = panels.iter().map(|p| p.width() + GAP).sum::<u32>().max(1);
    let height = panels.iter().map(|p| p.height()).max().unwrap_or(0) + CAPTION;
    let mut img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([40, 40, 50]));

    let mut x_offset = 0;
    for (panel, arena) in panels.iter().zip(arenas) {
        for (x, y, px) in panel.enumerate_pixels() {
            img.put_pixel(x_offset + x, y, *px);
        }
        let caption = format!("L{} SEED {}", arena.config.complexity, arena.seed);
        draw_label(&mut img, &caption, x_offset + 2, panel.height() + 4);
        x_offset += panel.width() + GAP;
    }
    img
}

/// Simple pixel-based text drawing with a 5x7 font
fn draw_label(img: &mut RgbImage, text: &str, x: u32, y: u32) {
    let color = Rgb([220, 220, 220]);
    for (i, c) in text.chars().enumerate() {
        draw_char(img, c, x + (i as u32) * 6, y, color);
    }
}

fn draw_char(img: &mut RgbImage, c: char, x: u32, y: u32, color: Rgb<u8>) {
    let bitmap = char_bitmap(c.to_ascii_uppercase());
    for (row, bits) in bitmap.iter().enumerate() {
        for col in 0..5 {
            if (bits >> (4 - col)) & 1 == 1 {
                let px = x + col;
                let py = y + row as u32;
                if px < img.width() && py < img.height() {
                    img.put_pixel(px, py, color);
                }
            }
        }
    }
}

/// 5x7 bitmap rows for the characters captions use
fn char_bitmap(c: char) -> [u8; 7] {
    match c {
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'S' => [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ' ' => [0; 7],
        _ => [0b11111; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::generate_arena;
    use crate::config::ArenaConfig;
    use crate::geometry::sink::NullSink;

    fn arena() -> Arena {
        generate_arena(&ArenaConfig::new(42, 120.0, 2), &mut NullSink).unwrap()
    }

    #[test]
    fn test_summary_json_lists_zones_and_entities() {
        let arena = arena();
        let json = summary_json(&arena).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["zones"].as_array().unwrap().len(), arena.tree.zone_count());
        assert_eq!(value["entities"].as_array().unwrap().len(), arena.entities.len());
        assert_eq!(value["rails"].as_array().unwrap().len(), arena.rails.len());
        // Tube meshes stay out of the summary
        assert!(value["rails"][0].get("tube").is_none());
    }

    #[test]
    fn test_layout_image_size_and_colors() {
        let arena = arena();
        let img = render_layout(&arena, 2.0);
        assert_eq!((img.width(), img.height()), (240, 240));
        let spawn = arena.spawn_points()[0];
        let x = ((spawn.x + 60.0) * 2.0).floor() as u32;
        let y = ((spawn.z + 60.0) * 2.0).floor() as u32;
        assert_eq!(img.get_pixel(x, y).0, entity_color(&EntityKind::Spawn { facing: Vec3::Z }));
    }

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(spectral_colormap(0.0), [94, 79, 163]);
        assert_eq!(spectral_colormap(1.0), [214, 61, 79]);
        assert_eq!(spectral_colormap(7.0), spectral_colormap(1.0));
    }
}
