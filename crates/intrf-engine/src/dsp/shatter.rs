//! Block-rate amplitude jitter ("shatter").
//!
//! One factor per block, not per sample: the level wobbles from block to
//! block like a fading radio link instead of turning into sample noise.

use super::rng::RandomSource;

/// `1 - uniform * depth`, in (1 - depth, 1 + depth].
#[inline]
pub fn shatter_factor<R: RandomSource>(rng: &mut R, depth_ratio: f32) -> f32 {
    1.0 - rng.uniform() * depth_ratio
}

/// Voice and noise factors for one block, drawn in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShatterFactors {
    pub voice: f32,
    pub noise: f32,
}

impl ShatterFactors {
    pub fn draw<R: RandomSource>(rng: &mut R, voice_depth: f32, noise_depth: f32) -> Self {
        let voice = shatter_factor(rng, voice_depth);
        let noise = shatter_factor(rng, noise_depth);
        Self { voice, noise }
    }
}
