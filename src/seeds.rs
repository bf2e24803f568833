//! Seeded random and noise source for arena generation
//!
//! A single [`ArenaRng`] is created per generation run and threaded through
//! every phase by `&mut`. Identical seeds consume identical sequences, which
//! is what keeps independently running clients in agreement about the arena.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Resolve a configured seed. Zero means "pick a fresh one".
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    loop {
        let fresh: u64 = rand::random();
        if fresh != 0 {
            return fresh;
        }
    }
}

/// Deterministic random sequence plus a 2D coherent noise field.
pub struct ArenaRng {
    seed: u64,
    rng: ChaCha8Rng,
    noise: Perlin,
    draws: u64,
}

impl ArenaRng {
    /// Create the source for a (non-zero) seed.
    ///
    /// The noise field is seeded from the first value of the sequence so
    /// that the whole run depends on exactly one number.
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise_seed: u32 = rng.gen();
        Self {
            seed,
            rng,
            noise: Perlin::new(noise_seed),
            draws: 1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn from the sequence so far (noise samples excluded).
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Uniform float in `[min, max]`. Returns `min` for an empty range.
    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        self.draws += 1;
        if max <= min {
            // Still consume a value so the draw count stays parameter independent
            let _: f32 = self.rng.gen();
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform integer in `[min, max]`.
    pub fn range_inclusive(&mut self, min: usize, max: usize) -> usize {
        self.draws += 1;
        if max <= min {
            let _: u32 = self.rng.gen();
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() called with an empty range");
        self.draws += 1;
        self.rng.gen_range(0..len.max(1))
    }

    /// Bernoulli draw.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.draws += 1;
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Uniform angle in radians.
    pub fn angle(&mut self) -> f32 {
        self.uniform(0.0, std::f32::consts::TAU)
    }

    /// Sample the coherent noise field, clamped to `[-1, 1]`.
    pub fn noise2(&self, x: f32, z: f32) -> f32 {
        (self.noise.get([x as f64, z as f64]) as f32).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for ArenaRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaRng")
            .field("seed", &self.seed)
            .field("draws", &self.draws)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ArenaRng::new(42);
        let mut b = ArenaRng::new(42);
        for _ in 0..32 {
            assert_eq!(a.uniform(-5.0, 5.0), b.uniform(-5.0, 5.0));
            assert_eq!(a.index(7), b.index(7));
        }
        assert_eq!(a.noise2(1.3, 7.9), b.noise2(1.3, 7.9));
        assert_eq!(a.draw_count(), b.draw_count());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = ArenaRng::new(1);
        let mut b = ArenaRng::new(2);
        let sa: Vec<f32> = (0..8).map(|_| a.uniform(0.0, 1.0)).collect();
        let sb: Vec<f32> = (0..8).map(|_| b.uniform(0.0, 1.0)).collect();
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_empty_range_still_consumes() {
        let mut rng = ArenaRng::new(9);
        let before = rng.draw_count();
        assert_eq!(rng.uniform(3.0, 3.0), 3.0);
        assert_eq!(rng.range_inclusive(4, 4), 4);
        assert_eq!(rng.draw_count(), before + 2);
    }

    #[test]
    fn test_resolve_seed() {
        assert_eq!(resolve_seed(1234), 1234);
        assert_ne!(resolve_seed(0), 0);
    }
}
