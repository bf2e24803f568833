//! Arena generation pipeline
//!
//! [`generate_arena`] runs the phases in a fixed order, all drawing from one
//! seeded [`ArenaRng`]:
//!
//! 1. partition the footprint into zones
//! 2. finalize zones and mirror their heights
//! 3. platforms and cover obstacles
//! 4. rails, loops and spring pads
//! 5. connectivity graph
//! 6. entities (spawns, power-ups, springs, hazards)
//! 7. reachability validation
//!
//! Geometry is streamed to a [`GeometrySink`] as it is produced; everything
//! else ends up in the returned [`Arena`].

pub mod generation;
pub mod placement;
pub mod types;

use glam::Vec3;
use serde::Serialize;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::geometry::{GeometryBound, GeometryNode, NodeRole, Rect};
use crate::geometry::sink::GeometrySink;
use crate::scale::ArenaScale;
use crate::seeds::{resolve_seed, ArenaRng};

use generation::connectivity::{ConnectivityGraph, ReachabilityReport};
use generation::{bsp, platforms, rails, structures, zones};
use types::{EntityKind, PartitionTree, PlacedEntity, Rail, RailKind};

/// Counters collected while generating
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub zones: usize,
    pub mirrored_pairs: usize,
    pub geometry_nodes: usize,
    pub triangles: usize,
    pub obstacles_placed: usize,
    pub obstacles_budgeted: usize,
    pub rails_built: usize,
    pub rails_rendered: usize,
    pub springs: usize,
    pub graph_edges: usize,
    pub rng_draws: u64,
}

/// A generated arena
#[derive(Clone, Debug)]
pub struct Arena {
    /// Resolved seed (never 0)
    pub seed: u64,
    /// Config the arena was built from, with the resolved seed
    pub config: ArenaConfig,
    pub scale: ArenaScale,
    pub tree: PartitionTree,
    pub graph: ConnectivityGraph,
    pub rails: Vec<Rail>,
    /// Every placed platform, obstacle and spring pad volume
    pub bounds: Vec<GeometryBound>,
    pub entities: Vec<PlacedEntity>,
    pub spawn_points: Vec<Vec3>,
    pub reachability: ReachabilityReport,
    pub stats: GenerationStats,
}

impl Arena {
    pub fn spawn_points(&self) -> &[Vec3] {
        &self.spawn_points
    }

    pub fn geometry_bounds(&self) -> &[GeometryBound] {
        &self.bounds
    }

    pub fn reachability(&self) -> &ReachabilityReport {
        &self.reachability
    }

    /// Entities with the given label (`"spawn"`, `"power_up"`, ...).
    pub fn entities_labelled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a PlacedEntity> + 'a {
        self.entities.iter().filter(move |e| e.kind.label() == label)
    }

    /// Zones along the shortest graph route from the first spawn to the last.
    /// `None` with fewer than two spawns or when the two are not connected.
    pub fn spawn_route(&self) -> Option<Vec<usize>> {
        let mut spawns = self.entities_labelled("spawn");
        let first = spawns.next()?.zone;
        let last = spawns.last()?.zone;
        self.graph.shortest_path(first, last)
    }

    /// Hash of the layout: zones, heights, rails and entities.
    ///
    /// Two clients that generated the same seed with the same config get the
    /// same value, which makes it cheap to confirm they agree on the arena.
    /// The value is the little-endian prefix of a BLAKE3 digest over the
    /// little-endian bit patterns, so it does not depend on the toolchain.
    pub fn layout_fingerprint(&self) -> u64 {
        let mut bytes = Vec::new();
        let mut feed = |v: f32| bytes.extend_from_slice(&v.to_bits().to_le_bytes());
        for zone in self.tree.zones() {
            for v in [zone.bounds.min.x, zone.bounds.min.y, zone.bounds.max.x, zone.bounds.max.y, zone.height_offset] {
                feed(v);
            }
        }
        for rail in &self.rails {
            for p in &rail.control_points {
                for v in p.to_array() {
                    feed(v);
                }
            }
        }
        for entity in &self.entities {
            for v in entity.position.to_array() {
                feed(v);
            }
        }
        bytes.extend_from_slice(&self.seed.to_le_bytes());
        digest_prefix(&bytes)
    }
}

/// First eight bytes of the BLAKE3 digest of `bytes`, little-endian.
pub fn digest_prefix(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn emit(sink: &mut dyn GeometrySink, stats: &mut GenerationStats, node: &GeometryNode) {
    stats.geometry_nodes += 1;
    stats.triangles += node.mesh.triangle_count();
    sink.add_node(node);
}

/// Generate an arena, streaming its geometry into `sink`.
pub fn generate_arena(config: &ArenaConfig, sink: &mut dyn GeometrySink) -> Result<Arena, ArenaError> {
    config.validate()?;

    let seed = resolve_seed(config.seed);
    let mut config = config.clone();
    config.seed = seed;

    let scale = ArenaScale::from_config(&config);
    let budget = config.budget();
    let mut rng = ArenaRng::new(seed);
    let mut stats = GenerationStats {
        obstacles_budgeted: budget.obstacles,
        ..GenerationStats::default()
    };

    log::info!(
        "Generating arena: seed {}, complexity {}, {}",
        seed,
        config.complexity,
        scale.describe()
    );

    // Partition
    let half = scale.half_extent();
    let mut tree = bsp::build_partition_tree(
        Rect::new(-half, -half, half, half),
        scale.min_zone_size,
        scale.max_height_variation,
        &config.partition,
        &mut rng,
    );
    stats.zones = tree.zone_count();
    log::info!(
        "Partitioned into {} zones ({} split iterations)",
        stats.zones,
        tree.iterations
    );

    // Zones
    zones::finalize_zones(&mut tree, config.partition.inset_range, &mut rng);
    if config.partition.mirror_heights {
        stats.mirrored_pairs = zones::apply_height_symmetry(&mut tree, config.partition.mirror_epsilon);
        log::debug!("Mirrored {} zone heights across x = 0", stats.mirrored_pairs);
    }

    // Platforms and obstacles
    let mut bounds: Vec<GeometryBound> = Vec::new();
    for (node, bound) in platforms::build_zone_platforms(&tree, &scale, &config.platforms, &rng) {
        emit(sink, &mut stats, &node);
        bounds.push(bound);
    }
    let obstacles = structures::place_obstacles(
        &tree,
        &scale,
        &config.platforms,
        &config.placement,
        budget.obstacles,
        &mut rng,
    );
    stats.obstacles_placed = obstacles.len();
    for (node, bound) in obstacles {
        emit(sink, &mut stats, &node);
        bounds.push(bound);
    }

    // Rails, loops and springs
    let rails = rails::plan_rails(&tree, &scale, &budget, &config.rails, &mut rng);
    for (index, rail) in rails.iter().enumerate() {
        stats.rails_built += 1;
        if let Some(tube) = &rail.tube {
            stats.rails_rendered += 1;
            let role = if rail.kind == RailKind::Loop {
                NodeRole::Loop
            } else {
                NodeRole::Rail
            };
            let node = GeometryNode {
                name: format!("{}_{:02}", rail.kind.name(), index),
                role,
                mesh: tube.mesh.clone(),
                collider: Some(tube.collider.clone()),
            };
            emit(sink, &mut stats, &node);
        }
    }
    let spring_sites = structures::plan_spring_sites(&tree, &scale, &bounds, budget.springs, &mut rng);
    for site in &spring_sites {
        emit(sink, &mut stats, &site.node);
        bounds.push(site.bound);
    }
    stats.springs = spring_sites.len();
    log::info!(
        "Built {} rails ({} rendered), {} obstacles, {} spring pads",
        stats.rails_built,
        stats.rails_rendered,
        stats.obstacles_placed,
        stats.springs
    );

    // Connectivity
    let graph = ConnectivityGraph::from_tree(&tree, scale.connection_distance);
    stats.graph_edges = graph.edges().len();
    log::debug!(
        "Connectivity graph: {} edges below {:.1} units",
        stats.graph_edges,
        graph.threshold()
    );

    // Entities
    let settings = &config.placement;
    let mut entities = placement::place_spawns(&tree, &graph, &bounds, settings);
    let spawn_zones: Vec<usize> = entities.iter().map(|e| e.zone).collect();
    let spawn_points: Vec<Vec3> = entities.iter().map(|e| e.position).collect();
    entities.extend(placement::place_power_ups(
        &tree,
        &graph,
        &bounds,
        &spawn_zones,
        budget.power_ups,
        settings,
        &mut rng,
    ));
    entities.extend(placement::place_springs(&tree, &spring_sites, &bounds, settings));
    entities.extend(placement::place_hazards(
        &tree,
        &bounds,
        &spawn_zones,
        budget.hazards,
        settings,
        &mut rng,
    ));
    log::info!(
        "Placed {} entities ({} spawns)",
        entities.len(),
        spawn_points.len()
    );

    // Validation
    let reachability = graph.validate_reachable(0);
    if !reachability.is_fully_connected() {
        log::warn!(
            "Arena {} is not fully connected: {} unreachable zones",
            seed,
            reachability.unreachable.len()
        );
    }

    sink.finish(&config.nav_bake);
    stats.rng_draws = rng.draw_count();
    log::info!(
        "Arena ready: {} nodes, {} triangles, {} graph edges",
        stats.geometry_nodes,
        stats.triangles,
        stats.graph_edges
    );

    Ok(Arena {
        seed,
        config,
        scale,
        tree,
        graph,
        rails,
        bounds,
        entities,
        spawn_points,
        reachability,
        stats,
    })
}

/// Count of entities per label, in a fixed order.
pub fn entity_counts(entities: &[PlacedEntity]) -> [(&'static str, usize); 4] {
    let count = |f: fn(&EntityKind) -> bool| entities.iter().filter(|e| f(&e.kind)).count();
    [
        ("spawn", count(|k| matches!(k, EntityKind::Spawn { .. }))),
        ("power_up", count(|k| matches!(k, EntityKind::PowerUp { .. }))),
        ("spring", count(|k| matches!(k, EntityKind::Spring { .. }))),
        ("hazard", count(|k| matches!(k, EntityKind::Hazard { .. }))),
    ]
}
