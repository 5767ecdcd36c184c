//! Live duplex engine: input device -> interference chain -> output device.
//!
//! The capture callback runs the chain and pushes into a [`SampleRing`]; the
//! playback callback drains it, or plays silence on underrun.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{error, info};
use parking_lot::Mutex;

use crate::dsp::interference::Interference;
use crate::dsp::rng::Prng;
use crate::dsp::MAX_CHANNELS;
use crate::graph::Chain;
use crate::params::{EffectParameters, EffectSettings};
use crate::ring::SampleRing;

/// Frames per chunk when the backend reports no buffer size range.
const DEFAULT_BLOCK: usize = 512;
/// Upper bound on the chunk size taken from a reported range.
const MAX_BLOCK: usize = 8192;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub input_name: Option<String>,       // match by substring (case-insensitive)
    pub output_name: Option<String>,
    pub input_index: Option<usize>,       // explicit index from device list
    pub output_index: Option<usize>,
    pub sample_rate: Option<u32>,         // e.g., 48000
    pub block_size: Option<u32>,          // frames per buffer (if backend supports)
    pub settings: EffectSettings,         // initial effect parameters
    pub seed: Option<u64>,                // reproducible noise/loss draws
}

pub struct Engine {
    input_stream: Option<cpal::Stream>,
    output_stream: Option<cpal::Stream>,
    cfg: EngineConfig,
    params: Arc<EffectParameters>,
    bypass: Arc<AtomicBool>,
    meters: Arc<Mutex<Vec<f32>>>,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        let params = Arc::new(EffectParameters::new(&cfg.settings));
        Self {
            input_stream: None,
            output_stream: None,
            cfg,
            params,
            bypass: Arc::new(AtomicBool::new(false)),
            meters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Live parameters; writes take effect on the next block.
    pub fn params(&self) -> Arc<EffectParameters> {
        self.params.clone()
    }

    pub fn set_bypass(&self, bypassed: bool) {
        self.bypass.store(bypassed, Ordering::Relaxed);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.input_stream.is_some()
    }

    /// Per-channel peak of the last processed block.
    pub fn meters(&self) -> Vec<f32> {
        self.meters.lock().clone()
    }

    /// Open both devices and start streaming through the interference effect.
    pub fn start(&mut self) -> Result<()> {
        let host = cpal::default_host();

        let in_dev = pick_device(&host, true, self.cfg.input_name.as_deref(), self.cfg.input_index)?
            .context("No input device matched (and no default available)")?;
        let out_dev = pick_device(&host, false, self.cfg.output_name.as_deref(), self.cfg.output_index)?
            .context("No output device matched (and no default available)")?;

        let in_cfg_any = in_dev.default_input_config().context("No default input config")?;
        let out_cfg_any = out_dev.default_output_config().context("No default output config")?;

        let mut in_cfg = in_cfg_any.config();
        let mut out_cfg = out_cfg_any.config();

        // Honor sample_rate/block_size if provided (best-effort)
        if let Some(sr) = self.cfg.sample_rate {
            in_cfg.sample_rate = cpal::SampleRate(sr);
            out_cfg.sample_rate = cpal::SampleRate(sr);
        }
        if let Some(bs) = self.cfg.block_size {
            out_cfg.buffer_size = cpal::BufferSize::Fixed(bs);
            in_cfg.buffer_size = cpal::BufferSize::Fixed(bs);
        }

        // Align channels/SR
        in_cfg.channels = out_cfg.channels;
        in_cfg.sample_rate = out_cfg.sample_rate;

        let channels = out_cfg.channels as usize;
        let block = chunk_frames(self.cfg.block_size, in_cfg_any.buffer_size());
        if channels > MAX_CHANNELS {
            info!("{channels} channels; channels past {MAX_CHANNELS} pass through unprocessed");
        }

        // Ring holds 8 blocks so capture jitter does not starve playback
        let ring = Arc::new(SampleRing::with_capacity((block * 8 * channels).max(1024)));

        let rng = match self.cfg.seed {
            Some(seed) => Prng::seeded(seed),
            None => Prng::new(),
        };
        let fx = Interference::with_rng(block, channels, rng)
            .context("Failed to allocate interference effect")?
            .with_params(self.params.clone());
        let mut chain = Chain::new(block, out_cfg.channels);
        chain.push(Box::new(fx)).context("Failed to prepare interference effect")?;

        {
            let mut meters = self.meters.lock();
            meters.clear();
            meters.resize(channels, 0.0);
        }

        let capture = Capture::new(
            chain,
            ring.clone(),
            self.meters.clone(),
            self.bypass.clone(),
            block,
            channels,
        );

        let input_stream = match in_cfg_any.sample_format() {
            cpal::SampleFormat::F32 => build_input::<f32>(&in_dev, &in_cfg, capture)?,
            cpal::SampleFormat::I16 => build_input::<i16>(&in_dev, &in_cfg, capture)?,
            cpal::SampleFormat::U16 => build_input::<u16>(&in_dev, &in_cfg, capture)?,
            other => return Err(anyhow!("Unsupported input format: {other:?}")),
        };

        let scratch_len = block * 4 * channels;
        let output_stream = match out_cfg_any.sample_format() {
            cpal::SampleFormat::F32 => build_output::<f32>(&out_dev, &out_cfg, ring, scratch_len)?,
            cpal::SampleFormat::I16 => build_output::<i16>(&out_dev, &out_cfg, ring, scratch_len)?,
            cpal::SampleFormat::U16 => build_output::<u16>(&out_dev, &out_cfg, ring, scratch_len)?,
            other => return Err(anyhow!("Unsupported output format: {other:?}")),
        };

        input_stream.play().context("Failed to play input stream")?;
        output_stream.play().context("Failed to play output stream")?;

        info!(
            "streaming {} -> {} at {} Hz, {} ch, {} frames/block",
            in_dev.name().unwrap_or_default(),
            out_dev.name().unwrap_or_default(),
            out_cfg.sample_rate.0,
            channels,
            block
        );

        self.input_stream = Some(input_stream);
        self.output_stream = Some(output_stream);
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.is_running() {
            info!("stopping streams");
        }
        self.input_stream = None;
        self.output_stream = None;
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frames the chain is prepared for. A fixed request wins; otherwise the
/// largest size the backend reports, capped at `MAX_BLOCK`.
fn chunk_frames(requested: Option<u32>, supported: &cpal::SupportedBufferSize) -> usize {
    let frames = match (requested, supported) {
        (Some(n), _) => n as usize,
        (None, cpal::SupportedBufferSize::Range { max, .. }) => (*max as usize).min(MAX_BLOCK),
        (None, cpal::SupportedBufferSize::Unknown) => DEFAULT_BLOCK,
    };
    frames.max(1)
}

/// State moved into the capture callback. Callbacks larger than the
/// prepared block are processed in chunks, so nothing here allocates.
struct Capture {
    chain: Chain,
    ring: Arc<SampleRing>,
    meters: Arc<Mutex<Vec<f32>>>,
    bypass: Arc<AtomicBool>,
    scratch: Vec<f32>,
    chunk_len: usize,
    peaks: Vec<f32>,
    chunk_peaks: Vec<f32>,
}

impl Capture {
    fn new(
        chain: Chain,
        ring: Arc<SampleRing>,
        meters: Arc<Mutex<Vec<f32>>>,
        bypass: Arc<AtomicBool>,
        block: usize,
        channels: usize,
    ) -> Self {
        let chunk_len = block.max(1) * channels.max(1);
        Self {
            chain,
            ring,
            meters,
            bypass,
            scratch: Vec::with_capacity(chunk_len),
            chunk_len,
            peaks: vec![0.0; channels],
            chunk_peaks: vec![0.0; channels],
        }
    }

    fn run<T: Copy>(&mut self, data: &[T])
    where
        f32: FromSample<T>,
    {
        self.chain.set_bypass(0, self.bypass.load(Ordering::Relaxed));
        self.peaks.fill(0.0);
        for chunk in data.chunks(self.chunk_len) {
            self.scratch.clear();
            self.scratch.extend(chunk.iter().map(|&s| f32::from_sample(s)));
            self.chain.process(&mut self.scratch);
            self.chain.peaks(&mut self.chunk_peaks);
            for (peak, &p) in self.peaks.iter_mut().zip(&self.chunk_peaks) {
                *peak = peak.max(p);
            }
            // Full ring: drop the chunk, playback is behind
            let _ = self.ring.push(&self.scratch);
        }
        // Never block the audio thread on the meter reader
        if let Some(mut meters) = self.meters.try_lock() {
            for (m, &p) in meters.iter_mut().zip(&self.peaks) {
                *m = p;
            }
        }
    }
}

fn build_input<T>(dev: &cpal::Device, cfg: &cpal::StreamConfig, mut capture: Capture) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = dev.build_input_stream::<T, _, _>(
        cfg,
        move |data: &[T], _| capture.run(data),
        move |err| error!("input stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_output<T>(
    dev: &cpal::Device,
    cfg: &cpal::StreamConfig,
    ring: Arc<SampleRing>,
    scratch_len: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut tmp = vec![0.0_f32; scratch_len];
    let stream = dev.build_output_stream::<T, _, _>(
        cfg,
        move |out: &mut [T], _| {
            if tmp.len() < out.len() {
                tmp.resize(out.len(), 0.0);
            }
            let tmp = &mut tmp[..out.len()];
            if ring.pop_into(tmp) {
                for (o, &v) in out.iter_mut().zip(tmp.iter()) {
                    *o = T::from_sample(v.clamp(-1.0, 1.0));
                }
            } else {
                out.fill(T::EQUILIBRIUM);
            }
        },
        move |err| error!("output stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

/* ---------- device picking (by name or index) ---------- */

fn supports(dev: &cpal::Device, want_input: bool) -> bool {
    if want_input {
        dev.supported_input_configs().is_ok()
    } else {
        dev.supported_output_configs().is_ok()
    }
}

fn pick_device(
    host: &cpal::Host,
    want_input: bool,
    name_substr: Option<&str>,
    index: Option<usize>,
) -> Result<Option<cpal::Device>> {
    // Explicit index first, counted among capable devices
    if let Some(idx) = index {
        if let Some(dev) = host.devices()?.filter(|d| supports(d, want_input)).nth(idx) {
            return Ok(Some(dev));
        }
    }

    if let Some(q) = name_substr {
        let q = q.to_lowercase();
        let found = host.devices()?.find(|dev| {
            let name = dev.name().unwrap_or_default().to_lowercase();
            name.contains(&q) && supports(dev, want_input)
        });
        if found.is_some() {
            return Ok(found);
        }
    }

    Ok(if want_input { host.default_input_device() } else { host.default_output_device() })
}
