//! Two cascaded one-pole lowpass stages with selectable output tap.
//!
//! ```text
//! stage0 += cutoff * (input  - stage0)
//! stage1 += cutoff * (stage0 - stage1)
//! ```
//!
//! Lowpass reads `stage1`, highpass `input - stage0`, bandpass `stage0 - stage1`.

use crate::params::FilterTap;

use super::MAX_CHANNELS;

/// Running state of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    pub stage0: f32,
    pub stage1: f32,
}

impl FilterState {
    /// Advance by one sample. `cutoff` is clamped to [0, 1]; 0 freezes the state.
    #[inline]
    pub fn apply(&mut self, cutoff: f32, input: f32, tap: FilterTap) -> f32 {
        let a = cutoff.clamp(0.0, 1.0);
        self.stage0 += a * (input - self.stage0);
        self.stage1 += a * (self.stage0 - self.stage1);
        match tap {
            FilterTap::Lowpass => self.stage1,
            FilterTap::Highpass => input - self.stage0,
            FilterTap::Bandpass => self.stage0 - self.stage1,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One [`FilterState`] per channel, owned by a single processor.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    states: [FilterState; MAX_CHANNELS],
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one sample of `channel`. Channels past [`MAX_CHANNELS`] pass through.
    #[inline]
    pub fn apply(&mut self, channel: usize, cutoff: f32, input: f32, tap: FilterTap) -> f32 {
        match self.states.get_mut(channel) {
            Some(state) => state.apply(cutoff, input, tap),
            None => input,
        }
    }

    pub fn state(&self, channel: usize) -> Option<&FilterState> {
        self.states.get(channel)
    }

    pub fn reset(&mut self) {
        self.states.iter_mut().for_each(FilterState::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cutoff_freezes() {
        let mut s = FilterState {
            stage0: 0.3,
            stage1: -0.2,
        };
        for x in [1.0, -1.0, 0.5, 100.0] {
            let lp = s.apply(0.0, x, FilterTap::Lowpass);
            assert_eq!(lp, -0.2);
            assert_eq!(s, FilterState { stage0: 0.3, stage1: -0.2 });
        }
        assert_eq!(s.apply(0.0, 0.9, FilterTap::Bandpass), 0.3 - -0.2);
    }

    #[test]
    fn unity_cutoff_tracks_input() {
        let mut s = FilterState::default();
        let out = s.apply(1.0, 0.75, FilterTap::Lowpass);
        assert_eq!(s.stage0, 0.75);
        assert_eq!(out, 0.75);
        assert_eq!(s.apply(1.0, 0.75, FilterTap::Lowpass), 0.75);
    }

    #[test]
    fn taps_derive_from_same_states() {
        let mut lp = FilterState::default();
        let mut hp = FilterState::default();
        let mut bp = FilterState::default();
        for x in [1.0, 0.0, -0.5, 0.25] {
            let l = lp.apply(0.3, x, FilterTap::Lowpass);
            let h = hp.apply(0.3, x, FilterTap::Highpass);
            let b = bp.apply(0.3, x, FilterTap::Bandpass);
            // Same state evolution regardless of tap
            assert_eq!(lp, hp);
            assert_eq!(lp, bp);
            assert!((h - (x - lp.stage0)).abs() < 1e-7);
            assert!((b - (lp.stage0 - l)).abs() < 1e-7);
        }
    }

    #[test]
    fn lowpass_settles_on_dc() {
        let mut s = FilterState::default();
        let mut y = 0.0;
        for _ in 0..2000 {
            y = s.apply(0.05, 1.0, FilterTap::Lowpass);
        }
        assert!((y - 1.0).abs() < 1e-4, "y={y}");
        assert!(s.apply(0.05, 1.0, FilterTap::Highpass).abs() < 1e-4);
    }

    #[test]
    fn channels_do_not_share_state() {
        let mut chain = FilterChain::new();
        for _ in 0..16 {
            chain.apply(0, 0.5, 1.0, FilterTap::Lowpass);
        }
        assert_eq!(chain.state(1), Some(&FilterState::default()));
        assert!(chain.state(0).unwrap().stage1 > 0.9);
        assert_eq!(chain.apply(MAX_CHANNELS, 0.5, 0.4, FilterTap::Lowpass), 0.4);

        chain.reset();
        assert_eq!(chain.state(0), Some(&FilterState::default()));
    }
}
