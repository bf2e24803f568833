//! Debug tool: render one seed at every complexity level side by side

use arena_generator::config::{MAX_COMPLEXITY, MIN_COMPLEXITY};
use arena_generator::export::render_layout_strip;
use arena_generator::{generate_arena, ArenaConfig, ArenaError, NullSink};

fn main() -> Result<(), ArenaError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(12345);
    let output = std::env::args().nth(2).unwrap_or_else(|| "layouts_debug.png".to_string());

    let mut arenas = Vec::new();
    for level in MIN_COMPLEXITY..=MAX_COMPLEXITY {
        let arena = generate_arena(&ArenaConfig::new(seed, 120.0, level), &mut NullSink)?;
        println!(
            "L{}: {} zones, {} rails, {} entities, {} triangles",
            level,
            arena.stats.zones,
            arena.rails.len(),
            arena.entities.len(),
            arena.stats.triangles
        );
        arenas.push(arena);
    }

    render_layout_strip(&arenas, 3.0).save(&output)?;
    println!("Saved {}", output);
    Ok(())
}
