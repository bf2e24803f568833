//! Arena scale: turns footprint fractions into world-space lengths.
//!
//! Everything the pipeline measures (zone sizes, step heights, connection
//! distance, slab thickness) scales linearly with the footprint, so a bigger
//! arena keeps the same proportions.

use crate::config::ArenaConfig;

/// Derived world-space lengths for one arena
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaScale {
    /// Side length of the square root footprint
    pub footprint: f32,

    /// Minimum zone extent on either axis
    pub min_zone_size: f32,

    /// Maximum height variation between zones
    pub max_height_variation: f32,

    /// Zone centers closer than this are connected
    pub connection_distance: f32,

    /// Platform slab thickness
    pub platform_thickness: f32,

    /// Maximum horizontal displacement of organic platform edges
    pub perturb_strength: f32,

    /// Height of rails above the platform they start on
    pub rail_clearance: f32,

    /// Height of the arch of a grind rail, before randomisation
    pub rail_arch: f32,
}

/// Reference footprint for which the fixed-size constants were tuned
const REFERENCE_FOOTPRINT: f32 = 120.0;

impl ArenaScale {
    pub fn from_config(config: &ArenaConfig) -> Self {
        let footprint = config.footprint_size;
        let ratio = footprint / REFERENCE_FOOTPRINT;
        Self {
            footprint,
            min_zone_size: footprint * config.partition.min_zone_fraction,
            max_height_variation: footprint * config.partition.height_variation_fraction,
            connection_distance: footprint * config.placement.connection_distance_fraction,
            platform_thickness: footprint * config.platforms.thickness_fraction,
            perturb_strength: if config.platforms.organic_edges {
                footprint * config.platforms.perturb_fraction
            } else {
                0.0
            },
            rail_clearance: 1.2 * ratio.sqrt(),
            rail_arch: footprint * 0.06,
        }
    }

    /// Half the footprint: the root rectangle spans `[-half, half]` on x and z
    pub fn half_extent(&self) -> f32 {
        self.footprint * 0.5
    }

    /// Format the arena size as a human-readable string
    pub fn describe(&self) -> String {
        format!(
            "{:.0} × {:.0} units (min zone {:.1}, link distance {:.1})",
            self.footprint, self.footprint, self.min_zone_size, self.connection_distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_linear_in_footprint() {
        let small = ArenaScale::from_config(&ArenaConfig::new(1, 120.0, 2));
        let large = ArenaScale::from_config(&ArenaConfig::new(1, 400.0, 2));
        assert!((small.min_zone_size - 24.0).abs() < 1e-4);
        assert!((large.connection_distance - 300.0).abs() < 1e-3);
        let ratio = large.footprint / small.footprint;
        assert!((large.min_zone_size / small.min_zone_size - ratio).abs() < 1e-4);
        assert!((large.connection_distance / small.connection_distance - ratio).abs() < 1e-4);
    }

    #[test]
    fn test_flat_edges_disable_perturbation() {
        let mut config = ArenaConfig::default();
        config.platforms.organic_edges = false;
        assert_eq!(ArenaScale::from_config(&config).perturb_strength, 0.0);
    }
}
