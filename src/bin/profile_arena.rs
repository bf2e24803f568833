//! Profiling tool: per-phase timings and a parallel determinism sweep

use std::time::{Duration, Instant};

use rayon::prelude::*;

use arena_generator::arena::generation::connectivity::ConnectivityGraph;
use arena_generator::arena::generation::{bsp, platforms, rails, zones};
use arena_generator::geometry::Rect;
use arena_generator::scale::ArenaScale;
use arena_generator::seeds::ArenaRng;
use arena_generator::{generate_arena, ArenaConfig, NullSink};

fn percent(part: Duration, total: Duration) -> f64 {
    100.0 * part.as_secs_f64() / total.as_secs_f64().max(1e-12)
}

fn main() {
    let seed = 1337u64;
    let config = ArenaConfig::new(seed, 120.0, 5);
    let scale = ArenaScale::from_config(&config);
    let budget = config.budget();

    println!("=== Arena Profiling ===");
    println!("Footprint: {}", scale.describe());
    println!();

    let mut rng = ArenaRng::new(seed);

    let start = Instant::now();
    let half = scale.half_extent();
    let mut tree = bsp::build_partition_tree(
        Rect::new(-half, -half, half, half),
        scale.min_zone_size,
        scale.max_height_variation,
        &config.partition,
        &mut rng,
    );
    let partition_time = start.elapsed();
    println!("Partition ({} zones): {:?}", tree.zone_count(), partition_time);

    let start = Instant::now();
    zones::finalize_zones(&mut tree, config.partition.inset_range, &mut rng);
    zones::apply_height_symmetry(&mut tree, config.partition.mirror_epsilon);
    let zone_time = start.elapsed();
    println!("Zones + symmetry: {:?}", zone_time);

    let start = Instant::now();
    let slabs = platforms::build_zone_platforms(&tree, &scale, &config.platforms, &rng);
    let platform_time = start.elapsed();
    let platform_tris: usize = slabs.iter().map(|(n, _)| n.mesh.triangle_count()).sum();
    println!("Platforms ({} triangles): {:?}", platform_tris, platform_time);

    let start = Instant::now();
    let built = rails::plan_rails(&tree, &scale, &budget, &config.rails, &mut rng);
    let rail_time = start.elapsed();
    let rail_tris: usize = built.iter().map(|r| r.triangle_count()).sum();
    println!("Rails ({} rails, {} triangles): {:?}", built.len(), rail_tris, rail_time);

    let start = Instant::now();
    let graph = ConnectivityGraph::from_tree(&tree, scale.connection_distance);
    let _ = graph.validate_reachable(0);
    let graph_time = start.elapsed();
    println!("Graph ({} edges): {:?}", graph.edges().len(), graph_time);

    let start = Instant::now();
    let full = generate_arena(&config, &mut NullSink);
    let full_time = start.elapsed();
    if let Err(err) = full {
        eprintln!("Full generation failed: {}", err);
        return;
    }
    println!("Full pipeline: {:?}", full_time);

    let total = partition_time + zone_time + platform_time + rail_time + graph_time;
    println!("\n=== Summary ===");
    println!("Partition:  {:>8.2}% ({:?})", percent(partition_time, total), partition_time);
    println!("Zones:      {:>8.2}% ({:?})", percent(zone_time, total), zone_time);
    println!("Platforms:  {:>8.2}% ({:?})", percent(platform_time, total), platform_time);
    println!("Rails:      {:>8.2}% ({:?})", percent(rail_time, total), rail_time);
    println!("Graph:      {:>8.2}% ({:?})", percent(graph_time, total), graph_time);

    // Every seed generated twice on the thread pool must agree with itself
    println!("\n=== Determinism sweep ===");
    let seeds: Vec<u64> = (1..=64).collect();
    let start = Instant::now();
    let mismatches: Vec<u64> = seeds
        .par_iter()
        .filter(|&&seed| {
            let config = ArenaConfig::new(seed, 120.0, 3);
            let a = generate_arena(&config, &mut NullSink).map(|a| a.layout_fingerprint());
            let b = generate_arena(&config, &mut NullSink).map(|a| a.layout_fingerprint());
            match (a, b) {
                (Ok(a), Ok(b)) => a != b,
                _ => true,
            }
        })
        .copied()
        .collect();
    println!("{} seeds in {:?}", seeds.len(), start.elapsed());
    if mismatches.is_empty() {
        println!("All seeds reproduced their layout");
    } else {
        println!("MISMATCH for seeds {:?}", mismatches);
    }
}
