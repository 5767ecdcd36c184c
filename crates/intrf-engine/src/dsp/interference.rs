//! The interference effect: shatter, gate, filter, noise, mix.
//!
//! Per block the processor takes one parameter snapshot, draws the voice and
//! noise shatter factors, and prepares the gate. Per sample and channel it
//! decides the gate, runs the voice through the filter (state advances even
//! while the gate is closed), scales or mutes it, and adds noise. Output is
//! mirrored into the monitor buffer for meters.

use std::sync::Arc;

use crate::error::{IntrfError, Result};
use crate::params::{ratio, EffectParameters, EffectSettings};

use super::effect::Effect;
use super::filter::FilterChain;
use super::gate::GateState;
use super::noise::noise_sample;
use super::rng::{Prng, RandomSource};
use super::shatter::ShatterFactors;
use super::MAX_CHANNELS;

pub struct Interference<R = Prng> {
    params: Arc<EffectParameters>,
    filter: FilterChain,
    rng: R,
    /// Interleaved copy of the last block, stride = that block's channel count.
    monitor: Vec<f32>,
    max_frames: usize,
    channels: usize,
    mirrored_frames: usize,
    mirrored_channels: usize,
}

impl<R: RandomSource> Interference<R> {
    /// Allocate for blocks of up to `max_frames` frames. `max_channels` is
    /// clamped into `1..=MAX_CHANNELS`.
    pub fn with_rng(max_frames: usize, max_channels: usize, rng: R) -> Result<Self> {
        let channels = max_channels.clamp(1, MAX_CHANNELS);
        Ok(Self {
            params: Arc::new(EffectParameters::default()),
            filter: FilterChain::new(),
            rng,
            monitor: alloc_monitor(max_frames, channels)?,
            max_frames,
            channels,
            mirrored_frames: 0,
            mirrored_channels: 0,
        })
    }

    /// Replace the parameter block, e.g. to share one with a control thread.
    pub fn with_params(mut self, params: Arc<EffectParameters>) -> Self {
        self.params = params;
        self
    }

    pub fn with_settings(self, settings: &EffectSettings) -> Self {
        self.params.apply(settings);
        self
    }

    pub fn params(&self) -> &Arc<EffectParameters> {
        &self.params
    }

    pub fn filter(&self) -> &FilterChain {
        &self.filter
    }

    /// Resize the monitor buffer. Reallocates only when the block size or
    /// channel count actually changes.
    pub fn prepare(&mut self, max_frames: usize, max_channels: usize) -> Result<()> {
        let channels = max_channels.clamp(1, MAX_CHANNELS);
        if max_frames == self.max_frames && channels == self.channels {
            return Ok(());
        }
        self.monitor = alloc_monitor(max_frames, channels)?;
        self.max_frames = max_frames;
        self.channels = channels;
        self.mirrored_frames = 0;
        self.mirrored_channels = 0;
        Ok(())
    }

    /// Zero parameters, filter state and monitor. No reallocation.
    pub fn reset(&mut self) {
        self.params.reset();
        self.filter.reset();
        self.monitor.fill(0.0);
        self.mirrored_frames = 0;
        self.mirrored_channels = 0;
    }

    /// Process `frames` interleaved frames from `input` into `output`.
    ///
    /// The frame count is cut down to what both slices hold.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], channels: usize, frames: usize) {
        if channels == 0 {
            return;
        }
        let frames = frames
            .min(input.len() / channels)
            .min(output.len() / channels);
        let len = frames * channels;
        output[..len].copy_from_slice(&input[..len]);
        self.process_in_place(&mut output[..len], channels);
    }

    /// Process an interleaved block in place. Channels past `MAX_CHANNELS`
    /// are left untouched.
    pub fn process_in_place(&mut self, block: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let active = channels.min(MAX_CHANNELS);
        let s = self.params.snapshot();

        let noise_volume = ratio(s.noise_volume);
        let cutoff = ratio(s.filter_cutoff);
        let shatter =
            ShatterFactors::draw(&mut self.rng, ratio(s.voice_shatter), ratio(s.noise_shatter));
        let mut gate = if s.loss_enabled {
            Some(GateState::begin_block(s.loss_rate, s.loss_model, &mut self.rng))
        } else {
            None
        };

        let mirror_frames = (block.len() / channels).min(self.monitor.len() / channels);

        for (i, frame) in block.chunks_exact_mut(channels).enumerate() {
            for (c, sample) in frame.iter_mut().take(active).enumerate() {
                let open = match gate.as_mut() {
                    Some(g) => g.decide(i, &mut self.rng),
                    None => true,
                };
                let mut voice = *sample;
                if s.filter_enabled {
                    voice = self.filter.apply(c, cutoff, voice, s.filter_type);
                }
                let voice = if open { voice * shatter.voice } else { 0.0 };
                *sample = voice + noise_sample(&mut self.rng, noise_volume, shatter.noise);
            }
            if i < mirror_frames {
                self.monitor[i * channels..(i + 1) * channels].copy_from_slice(frame);
            }
        }

        self.mirrored_frames = mirror_frames;
        self.mirrored_channels = channels;
    }

    /// Read-only view of the last processed block.
    pub fn monitor(&self) -> MonitorSnapshot<'_> {
        let len = self.mirrored_frames * self.mirrored_channels;
        MonitorSnapshot {
            samples: &self.monitor[..len],
            channels: self.mirrored_channels,
        }
    }
}

impl<R: RandomSource + Send> Effect for Interference<R> {
    fn prepare(&mut self, max_frames: usize, channels: u16) -> Result<()> {
        Interference::prepare(self, max_frames, channels as usize)
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        self.process_in_place(block, channels);
    }

    fn monitor(&self) -> Option<MonitorSnapshot<'_>> {
        Some(Interference::monitor(self))
    }
}

fn alloc_monitor(max_frames: usize, channels: usize) -> Result<Vec<f32>> {
    let len = max_frames.checked_mul(channels).ok_or(IntrfError::Memory {
        bytes: usize::MAX,
    })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| IntrfError::Memory {
        bytes: len.saturating_mul(std::mem::size_of::<f32>()),
    })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// Borrowed view of the monitor buffer.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSnapshot<'a> {
    samples: &'a [f32],
    channels: usize,
}

impl<'a> MonitorSnapshot<'a> {
    /// Interleaved samples of the last block.
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Largest absolute sample of `channel`, 0 if it was not in the block.
    pub fn peak(&self, channel: usize) -> f32 {
        if channel >= self.channels {
            return 0.0;
        }
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .fold(0.0_f32, |m, s| m.max(s.abs()))
    }
}
