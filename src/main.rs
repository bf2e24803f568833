use std::process::ExitCode;

use clap::Parser;

use arena_generator::arena::entity_counts;
use arena_generator::geometry::obj::ObjWriter;
use arena_generator::{ascii, export, generate_arena, Arena, ArenaConfig, ArenaError, NullSink};

#[derive(Parser, Debug)]
#[command(name = "arena_generator")]
#[command(about = "Generate seeded procedural 3D arenas")]
struct Args {
    /// Random seed (0 or omitted picks a random seed)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Side length of the square footprint in world units
    #[arg(long)]
    size: Option<f32>,

    /// Structure density, 1-5
    #[arg(short, long)]
    complexity: Option<u8>,

    /// JSON config file; command-line values override it
    #[arg(long)]
    config: Option<String>,

    /// Export a JSON summary of the layout
    #[arg(long)]
    export_json: Option<String>,

    /// Export a top-down PNG map of the layout
    #[arg(long)]
    export_map: Option<String>,

    /// Pixels per world unit for the PNG map
    #[arg(long, default_value = "4")]
    map_scale: f32,

    /// Export all emitted geometry as a Wavefront OBJ file
    #[arg(long)]
    export_obj: Option<String>,

    /// Print an ASCII layout with this many columns
    #[arg(long)]
    ascii: Option<usize>,
}

fn build_config(args: &Args) -> Result<ArenaConfig, ArenaError> {
    let mut config = match &args.config {
        Some(path) => ArenaConfig::from_json_file(path)?,
        None => ArenaConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(size) = args.size {
        config.footprint_size = size;
    }
    if let Some(complexity) = args.complexity {
        config.complexity = complexity;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), ArenaError> {
    let config = build_config(args)?;

    let arena = match &args.export_obj {
        Some(path) => {
            let mut obj = ObjWriter::new();
            let arena = generate_arena(&config, &mut obj)?;
            obj.save(path)?;
            println!("Wrote {} objects to {}", obj.object_count(), path);
            arena
        }
        None => generate_arena(&config, &mut NullSink)?,
    };

    print_summary(&arena);

    if let Some(path) = &args.export_json {
        export::export_summary_json(&arena, path)?;
        println!("Wrote summary to {}", path);
    }
    if let Some(path) = &args.export_map {
        export::export_layout_png(&arena, path, args.map_scale)?;
        println!("Wrote layout map to {}", path);
    }
    if let Some(columns) = args.ascii {
        println!();
        print!("{}", ascii::render_ascii_layout(&arena, columns));
        println!("{}", ascii::layout_legend());
    }
    Ok(())
}

fn print_summary(arena: &Arena) {
    let stats = &arena.stats;
    println!("Arena seed: {}", arena.seed);
    println!("Footprint: {}", arena.scale.describe());
    println!(
        "Zones: {} ({} mirrored pairs), {} graph edges",
        stats.zones, stats.mirrored_pairs, stats.graph_edges
    );
    println!(
        "Rails: {} built, {} rendered; obstacles {}/{}; springs {}",
        stats.rails_built, stats.rails_rendered, stats.obstacles_placed, stats.obstacles_budgeted, stats.springs
    );
    for (label, count) in entity_counts(&arena.entities) {
        println!("  {:<9} {}", label, count);
    }
    println!("Geometry: {} nodes, {} triangles", stats.geometry_nodes, stats.triangles);
    let report = arena.reachability();
    if report.is_fully_connected() {
        println!("All {} zones reachable", report.reachable_count);
    } else {
        println!(
            "WARNING: {} zones unreachable from zone {}: {:?}",
            report.unreachable.len(),
            report.origin,
            report.unreachable
        );
    }
    if let Some(route) = arena.spawn_route() {
        let hops: Vec<String> = route.iter().map(|z| z.to_string()).collect();
        println!("Spawn route: {}", hops.join(" -> "));
    }
    println!("Layout fingerprint: {:016x}", arena.layout_fingerprint());
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
