//! Configuration for arena generation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ArenaError;

pub const MIN_COMPLEXITY: u8 = 1;
pub const MAX_COMPLEXITY: u8 = 5;

/// Top-level configuration, provided before generation runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Generation seed (0 = pick a fresh seed).
    pub seed: u64,

    /// Base horizontal scale of the arena in world units.
    /// Every margin, height tier and distance is a fraction of this.
    pub footprint_size: f32,

    /// Structural density, selects a row of [`ComplexityBudget`].
    pub complexity: u8,

    pub partition: PartitionSettings,
    pub platforms: PlatformSettings,
    pub rails: RailSettings,
    pub placement: PlacementSettings,
    pub nav_bake: NavBakeSettings,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            footprint_size: 120.0,
            complexity: 2,
            partition: PartitionSettings::default(),
            platforms: PlatformSettings::default(),
            rails: RailSettings::default(),
            placement: PlacementSettings::default(),
            nav_bake: NavBakeSettings::default(),
        }
    }
}

/// Binary space partitioning parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSettings {
    /// Inclusive range the target leaf count is drawn from.
    pub zone_count_range: [usize; 2],
    /// Hard cap on split iterations.
    pub max_iterations: usize,
    /// Split ratio range along the chosen axis.
    pub split_ratio_range: [f32; 2],
    /// Minimum zone extent as a fraction of the footprint.
    pub min_zone_fraction: f32,
    /// Maximum height variation as a fraction of the footprint.
    pub height_variation_fraction: f32,
    /// Share of the height variation a single split may add.
    pub height_step_share: f32,
    /// Inset range for the buildable platform rect.
    pub inset_range: [f32; 2],
    /// Mirror zone heights across the x = 0 plane.
    pub mirror_heights: bool,
    /// Half-width of the band around the mirror axis left untouched.
    pub mirror_epsilon: f32,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            zone_count_range: [8, 16],
            max_iterations: 50,
            split_ratio_range: [0.4, 0.6],
            min_zone_fraction: 0.2,
            height_variation_fraction: 0.15,
            height_step_share: 0.3,
            inset_range: [0.75, 0.90],
            mirror_heights: true,
            mirror_epsilon: 0.5,
        }
    }
}

/// Platform mesh parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Grid subdivisions per axis for the visual mesh.
    pub subdivisions: usize,
    /// Perturb platform edges with noise.
    pub organic_edges: bool,
    /// Edge perturbation strength as a fraction of the footprint.
    pub perturb_fraction: f32,
    /// Noise frequency (per world unit) for edge perturbation.
    pub noise_frequency: f32,
    /// Platform slab thickness as a fraction of the footprint.
    pub thickness_fraction: f32,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            subdivisions: 4,
            organic_edges: true,
            perturb_fraction: 0.015,
            noise_frequency: 0.09,
            thickness_fraction: 0.03,
        }
    }
}

/// Rail and tube parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailSettings {
    /// Tube radius in world units.
    pub radius: f32,
    /// Vertices per tube ring.
    pub ring_segments: usize,
    /// Ring samples per unit of arc length.
    pub samples_per_unit: f32,
    pub min_samples: usize,
    pub max_samples: usize,
    /// Paths shorter than this get no tube mesh.
    pub min_render_length: f32,
    /// Tangent handle length in world units.
    pub handle_length: f32,
    /// Ring centers closer than this are treated as degenerate.
    pub degenerate_epsilon: f32,
    /// Bézier flattening steps per control segment.
    pub flatten_steps: usize,
}

impl Default for RailSettings {
    fn default() -> Self {
        Self {
            radius: 0.3,
            ring_segments: 8,
            samples_per_unit: 1.5,
            min_samples: 4,
            max_samples: 200,
            min_render_length: 2.0,
            handle_length: 4.0,
            degenerate_epsilon: 1e-3,
            flatten_steps: 12,
        }
    }
}

/// Entity placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub spawn_count: usize,
    /// Height added on top of a snapped surface.
    pub snap_offset: f32,
    /// Horizontal slack when testing whether a bound lies under a point.
    pub footprint_tolerance: f32,
    /// Fallback height when nothing lies beneath a query point.
    pub default_height: f32,
    /// Attempts per structure before giving up on it.
    pub max_attempts: usize,
    /// Gravity used to solve spring launch arcs.
    pub gravity: f32,
    /// Height of a spring arc above the higher of its two ends.
    pub spring_apex_clearance: f32,
    /// Zone connection distance as a fraction of the footprint.
    pub connection_distance_fraction: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            spawn_count: 8,
            snap_offset: 0.1,
            footprint_tolerance: 0.05,
            default_height: 0.0,
            max_attempts: 12,
            gravity: 20.0,
            spring_apex_clearance: 3.0,
            connection_distance_fraction: 0.75,
        }
    }
}

/// Parameters handed to the external navigation-mesh bake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavBakeSettings {
    pub agent_radius: f32,
    pub agent_height: f32,
    pub max_slope_degrees: f32,
}

impl Default for NavBakeSettings {
    fn default() -> Self {
        Self {
            agent_radius: 0.5,
            agent_height: 2.0,
            max_slope_degrees: 45.0,
        }
    }
}

/// Structure counts per complexity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityBudget {
    pub grind_rails: usize,
    pub spirals: usize,
    pub branches: usize,
    pub loops: usize,
    pub springs: usize,
    pub power_ups: usize,
    pub hazards: usize,
    pub obstacles: usize,
}

impl ComplexityBudget {
    /// Look up the budget for a level, clamping into the supported range.
    pub fn for_level(level: u8) -> Self {
        let (grind_rails, spirals, branches, loops, springs, power_ups, hazards, obstacles) =
            match level.clamp(MIN_COMPLEXITY, MAX_COMPLEXITY) {
                1 => (2, 0, 0, 0, 2, 3, 1, 4),
                2 => (3, 1, 1, 1, 3, 4, 2, 6),
                3 => (4, 1, 2, 1, 4, 5, 3, 8),
                4 => (5, 2, 2, 2, 5, 6, 4, 10),
                _ => (6, 2, 3, 2, 6, 8, 5, 12),
            };
        Self {
            grind_rails,
            spirals,
            branches,
            loops,
            springs,
            power_ups,
            hazards,
            obstacles,
        }
    }
}

impl ArenaConfig {
    /// Config with the given seed, size and complexity and default tunables.
    pub fn new(seed: u64, footprint_size: f32, complexity: u8) -> Self {
        Self {
            seed,
            footprint_size,
            complexity,
            ..Self::default()
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ArenaError> {
        let text = std::fs::read_to_string(path)?;
        let config: ArenaConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn budget(&self) -> ComplexityBudget {
        ComplexityBudget::for_level(self.complexity)
    }

    /// Reject configurations the generator cannot honour.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.footprint_size.is_finite() || self.footprint_size <= 0.0 {
            return Err(ArenaError::InvalidFootprint {
                size: self.footprint_size,
            });
        }
        if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&self.complexity) {
            return Err(ArenaError::ComplexityOutOfRange {
                level: self.complexity,
                min: MIN_COMPLEXITY,
                max: MAX_COMPLEXITY,
            });
        }

        let p = &self.partition;
        if p.zone_count_range[0] == 0 || p.zone_count_range[0] > p.zone_count_range[1] {
            return Err(ArenaError::setting(
                "partition.zone_count_range",
                format!("expected 1 <= min <= max, got {:?}", p.zone_count_range),
            ));
        }
        check_unit_range("partition.split_ratio_range", p.split_ratio_range)?;
        check_unit_range("partition.inset_range", p.inset_range)?;
        if !(p.min_zone_fraction > 0.0 && p.min_zone_fraction <= 0.5) {
            return Err(ArenaError::setting(
                "partition.min_zone_fraction",
                format!("expected (0, 0.5], got {}", p.min_zone_fraction),
            ));
        }
        if p.height_variation_fraction < 0.0 || p.height_step_share < 0.0 {
            return Err(ArenaError::setting(
                "partition.height_variation_fraction",
                "height parameters must not be negative",
            ));
        }

        if self.platforms.subdivisions == 0 {
            return Err(ArenaError::setting("platforms.subdivisions", "must be at least 1"));
        }
        if self.platforms.thickness_fraction <= 0.0 {
            return Err(ArenaError::setting("platforms.thickness_fraction", "must be positive"));
        }

        let r = &self.rails;
        if r.ring_segments < 3 {
            return Err(ArenaError::setting("rails.ring_segments", "must be at least 3"));
        }
        if r.min_samples < 2 || r.min_samples > r.max_samples {
            return Err(ArenaError::setting(
                "rails.min_samples",
                format!("expected 2 <= min <= max, got {}..{}", r.min_samples, r.max_samples),
            ));
        }
        if r.radius <= 0.0 || r.samples_per_unit <= 0.0 || r.flatten_steps == 0 {
            return Err(ArenaError::setting(
                "rails",
                "radius, samples_per_unit and flatten_steps must be positive",
            ));
        }

        if self.placement.gravity <= 0.0 {
            return Err(ArenaError::setting("placement.gravity", "must be positive"));
        }
        if self.placement.connection_distance_fraction <= 0.0 {
            return Err(ArenaError::setting(
                "placement.connection_distance_fraction",
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn check_unit_range(name: &'static str, range: [f32; 2]) -> Result<(), ArenaError> {
    if !(range[0] > 0.0 && range[0] <= range[1] && range[1] <= 1.0) {
        return Err(ArenaError::setting(
            name,
            format!("expected 0 < min <= max <= 1, got {:?}", range),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.partition.zone_count_range, [8, 16]);
        assert_eq!(config.partition.max_iterations, 50);
    }

    #[test]
    fn test_rejects_bad_footprint() {
        let config = ArenaConfig::new(1, -4.0, 2);
        assert!(matches!(config.validate(), Err(ArenaError::InvalidFootprint { .. })));
        let config = ArenaConfig::new(1, f32::NAN, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_complexity() {
        let config = ArenaConfig::new(1, 120.0, 9);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::ComplexityOutOfRange { level: 9, .. })
        ));
    }

    #[test]
    fn test_budget_grows_with_complexity() {
        let mut previous = ComplexityBudget::for_level(1);
        for level in 2..=MAX_COMPLEXITY {
            let budget = ComplexityBudget::for_level(level);
            assert!(budget.grind_rails >= previous.grind_rails);
            assert!(budget.obstacles >= previous.obstacles);
            assert!(budget.power_ups >= previous.power_ups);
            previous = budget;
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ArenaConfig =
            serde_json::from_str(r#"{"seed": 7, "rails": {"radius": 0.5}}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.rails.radius, 0.5);
        assert_eq!(config.rails.ring_segments, 8);
        assert_eq!(config.footprint_size, 120.0);
    }
}
