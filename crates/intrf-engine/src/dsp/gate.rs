//! Sample gate: decides per sample whether the voice gets through.
//!
//! A loss rate of `p` percent gives `max_period = floor(100 / (100 - p))`; the
//! gate opens on sample indices that are multiples of the current period.
//! `p == 100` yields `max_period == 0`, which closes the gate for good and
//! skips the modulo.

use crate::params::LossModel;

use super::rng::RandomSource;

/// Per-block gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateState {
    model: LossModel,
    max_period: u32,
    period: u32,
}

/// Longest period derived from a loss rate in percent. 0 means drop everything.
/// Computed from the percentage in f64 so whole percents floor exactly.
pub fn max_period(loss_percent: f32) -> u32 {
    let p = if loss_percent.is_nan() {
        0.0
    } else {
        f64::from(loss_percent).clamp(0.0, 100.0)
    };
    if p >= 100.0 {
        return 0;
    }
    // `as` saturates at u32::MAX for rates very close to 100
    (100.0 / (100.0 - p)).floor() as u32
}

impl GateState {
    /// Prepare a block. Only the `Buffer` model draws here.
    pub fn begin_block<R: RandomSource>(loss_percent: f32, model: LossModel, rng: &mut R) -> Self {
        let max_period = max_period(loss_percent);
        let period = match model {
            LossModel::Buffer if max_period > 0 => draw_period(max_period, rng),
            _ => max_period,
        };
        Self {
            model,
            max_period,
            period,
        }
    }

    /// Gate decision for `index` within the block. `Random` redraws first.
    #[inline]
    pub fn decide<R: RandomSource>(&mut self, index: usize, rng: &mut R) -> bool {
        if self.max_period == 0 {
            return false;
        }
        if self.model == LossModel::Random {
            self.period = draw_period(self.max_period, rng);
        }
        index % self.period as usize == 0
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn max_period(&self) -> u32 {
        self.max_period
    }
}

/// Uniform in [1, max_period]. `max_period` must be non-zero.
#[inline]
fn draw_period<R: RandomSource>(max_period: u32, rng: &mut R) -> u32 {
    1 + rng.bounded(max_period)
}
