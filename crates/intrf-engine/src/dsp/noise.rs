//! Per-sample noise injection.

use super::rng::RandomSource;

/// Keeps full-volume noise well below the voice.
pub const NOISE_SCALE: f32 = 0.02;

/// One noise sample: `uniform * volume * NOISE_SCALE * shatter`.
#[inline]
pub fn noise_sample<R: RandomSource>(rng: &mut R, volume_ratio: f32, shatter_factor: f32) -> f32 {
    rng.uniform() * volume_ratio * NOISE_SCALE * shatter_factor
}
