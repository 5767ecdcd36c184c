//! Host boundary.
//!
//! [`Instance`] is the handle a plugin host drives: create, process, get/set
//! parameters by index, read the monitor, release. Every call after
//! [`Instance::release`] fails with [`IntrfError::InvalidState`].

use std::sync::Arc;

use log::debug;

use crate::dsp::interference::{Interference, MonitorSnapshot};
use crate::dsp::rng::{Prng, RandomSource};
use crate::error::{IntrfError, Result};
use crate::params::EffectParameters;

/// Lifecycle of an [`Instance`]. `Created` is not observable: `create`
/// either returns an `Active` instance or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Bypassed,
    Released,
}

pub struct Instance<R = Prng> {
    fx: Option<Box<Interference<R>>>,
    bypassed: bool,
}

impl Instance<Prng> {
    /// Allocate an instance for blocks of up to `block_size_hint` frames and
    /// up to `max_channels` channels (clamped to 8).
    pub fn create(block_size_hint: usize, max_channels: usize) -> Result<Self> {
        Self::create_with_rng(block_size_hint, max_channels, Prng::new())
    }
}

impl<R: RandomSource> Instance<R> {
    pub fn create_with_rng(block_size_hint: usize, max_channels: usize, rng: R) -> Result<Self> {
        let fx = Interference::with_rng(block_size_hint, max_channels, rng)?;
        Ok(Self {
            fx: Some(Box::new(fx)),
            bypassed: false,
        })
    }

    pub fn state(&self) -> Lifecycle {
        match (&self.fx, self.bypassed) {
            (None, _) => Lifecycle::Released,
            (Some(_), true) => Lifecycle::Bypassed,
            (Some(_), false) => Lifecycle::Active,
        }
    }

    fn fx(&self) -> Result<&Interference<R>> {
        self.fx.as_deref().ok_or_else(released)
    }

    fn fx_mut(&mut self) -> Result<&mut Interference<R>> {
        self.fx.as_deref_mut().ok_or_else(released)
    }

    /// Drop all owned state. Calling it again is a no-op.
    pub fn release(&mut self) {
        self.fx = None;
        self.bypassed = false;
    }

    /// Zero parameters and filter state. Does not reallocate.
    pub fn reset(&mut self) -> Result<()> {
        self.fx_mut()?.reset();
        Ok(())
    }

    /// Resize for a new host block size or channel count.
    pub fn prepare(&mut self, block_size: usize, max_channels: usize) -> Result<()> {
        self.fx_mut()?.prepare(block_size, max_channels)
    }

    /// Switch between `Active` and `Bypassed`.
    pub fn set_bypass(&mut self, bypassed: bool) -> Result<()> {
        self.fx()?;
        self.bypassed = bypassed;
        Ok(())
    }

    /// Process `frames` interleaved frames of `channels` channels. While
    /// bypassed the input is copied through unmodified.
    pub fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        channels: usize,
        frames: usize,
    ) -> Result<()> {
        let bypassed = self.bypassed;
        let fx = self.fx_mut()?;
        if bypassed {
            if channels > 0 {
                let len = frames.min(input.len() / channels).min(output.len() / channels) * channels;
                output[..len].copy_from_slice(&input[..len]);
            }
        } else {
            fx.process(input, output, channels, frames);
        }
        Ok(())
    }

    /// Shared parameter block for a control thread.
    pub fn parameters(&self) -> Result<Arc<EffectParameters>> {
        Ok(self.fx()?.params().clone())
    }

    pub fn set_parameter_float(&mut self, index: usize, value: f32) -> Result<()> {
        self.fx()?.params().set_float(index, value)
    }

    pub fn get_parameter_float(&self, index: usize) -> Result<f32> {
        self.fx()?.params().get_float(index)
    }

    pub fn set_parameter_int(&mut self, index: usize, value: i32) -> Result<()> {
        self.fx()?.params().set_int(index, value)
    }

    pub fn get_parameter_int(&self, index: usize) -> Result<i32> {
        self.fx()?.params().get_int(index)
    }

    pub fn set_parameter_bool(&mut self, index: usize, value: bool) -> Result<()> {
        self.fx()?.params().set_bool(index, value)
    }

    pub fn get_parameter_bool(&self, index: usize) -> Result<bool> {
        self.fx()?.params().get_bool(index)
    }

    /// Last processed block, for visualisation.
    pub fn monitor_snapshot(&self) -> Result<MonitorSnapshot<'_>> {
        Ok(self.fx()?.monitor())
    }
}

fn released() -> IntrfError {
    debug!("call on a released interference instance");
    IntrfError::InvalidState
}
