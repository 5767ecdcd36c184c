//! Real-time voice interference effect.
//!
//! Degrades a voice signal the way a bad radio or VoIP link does: block-rate
//! amplitude jitter ("shatter"), injected noise, probabilistic sample loss,
//! and an optional one-pole filter colouring the voice.
//!
//! [`host::Instance`] is the handle-style boundary a plugin host drives;
//! [`dsp::interference::Interference`] is the processor behind it. With the
//! `live` feature, [`Engine`] runs the effect between two audio devices.

#[cfg(feature = "live")]
pub mod devices;
pub mod dsp;
#[cfg(feature = "live")]
pub mod engine;
pub mod error;
pub mod graph;
pub mod host;
pub mod params;
pub mod ring;

pub use dsp::interference::{Interference, MonitorSnapshot};
pub use dsp::rng::{Prng, RandomSource};
pub use dsp::MAX_CHANNELS;
#[cfg(feature = "live")]
pub use engine::{Engine, EngineConfig};
pub use error::{IntrfError, ParamKind, Result};
pub use host::{Instance, Lifecycle};
pub use params::{EffectParameters, EffectSettings, FilterTap, LossModel, ParamId};
