//! Procedural arena generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod arena;
pub mod ascii;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod scale;
pub mod seeds;

pub use arena::{generate_arena, Arena};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use geometry::sink::{GeometrySink, NullSink, SceneCollector};
