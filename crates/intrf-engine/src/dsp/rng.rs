//! Random source for noise, shatter and gate draws.
//!
//! Each processor owns its own generator. Not thread-safe by construction:
//! `&mut self` on every draw.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform value in [-1, 1).
    fn uniform(&mut self) -> f32;

    /// Uniform integer in [0, max). Returns 0 when `max` is 0.
    fn bounded(&mut self, max: u32) -> u32;
}

/// Default generator: a fast non-cryptographic PRNG.
#[derive(Debug, Clone)]
pub struct Prng {
    rng: SmallRng,
}

impl Prng {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible sequence for tests and offline renders.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }
}

impl Default for Prng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for Prng {
    #[inline]
    fn uniform(&mut self) -> f32 {
        self.rng.gen::<f32>() * 2.0 - 1.0
    }

    #[inline]
    fn bounded(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }
}
