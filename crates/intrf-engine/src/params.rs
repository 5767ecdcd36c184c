//! Effect parameters.
//!
//! Parameters are addressed by a fixed index table shared with the host.
//! Every field is stored in its own atomic so a UI thread can read and write
//! while the audio thread processes; there is no cross-field consistency.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::error::{IntrfError, ParamKind, Result};

/// How gate-closed periods are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossModel {
    /// Fixed period derived from the loss rate.
    #[default]
    Constant,
    /// Period redrawn before every sample.
    Random,
    /// Period drawn once per block.
    Buffer,
}

/// Output tap of the cascaded one-pole filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterTap {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
}

macro_rules! ordinal_enum {
    ($ty:ident { $($ord:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn from_ordinal(ordinal: i32) -> Option<Self> {
                match ordinal {
                    $($ord => Some($ty::$variant),)+
                    _ => None,
                }
            }

            pub fn ordinal(self) -> i32 {
                match self {
                    $($ty::$variant => $ord,)+
                }
            }
        }
    };
}

ordinal_enum!(LossModel { 0 => Constant, 1 => Random, 2 => Buffer });
ordinal_enum!(FilterTap { 0 => Lowpass, 1 => Highpass, 2 => Bandpass });

/// Host-visible parameter identifiers, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    VoiceShatter,
    NoiseVolume,
    NoiseShatter,
    LossRate,
    LossModel,
    LossEnabled,
    FilterCutoff,
    FilterType,
    FilterEnabled,
}

impl ParamId {
    /// Index order is a contract with the host. Do not reorder.
    pub const ALL: [ParamId; 9] = [
        ParamId::VoiceShatter,
        ParamId::NoiseVolume,
        ParamId::NoiseShatter,
        ParamId::LossRate,
        ParamId::LossModel,
        ParamId::LossEnabled,
        ParamId::FilterCutoff,
        ParamId::FilterType,
        ParamId::FilterEnabled,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> ParamKind {
        match self {
            ParamId::VoiceShatter
            | ParamId::NoiseVolume
            | ParamId::NoiseShatter
            | ParamId::LossRate
            | ParamId::FilterCutoff => ParamKind::Float,
            ParamId::LossModel | ParamId::FilterType => ParamKind::Int,
            ParamId::LossEnabled | ParamId::FilterEnabled => ParamKind::Bool,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamId::VoiceShatter => "Voice Shatter",
            ParamId::NoiseVolume => "Noise Volume",
            ParamId::NoiseShatter => "Noise Shatter",
            ParamId::LossRate => "Loss Rate",
            ParamId::LossModel => "Loss Model",
            ParamId::LossEnabled => "Loss",
            ParamId::FilterCutoff => "Filter Cutoff",
            ParamId::FilterType => "Filter Type",
            ParamId::FilterEnabled => "Filter",
        }
    }

    pub fn unit(self) -> &'static str {
        match self.kind() {
            ParamKind::Float => "%",
            ParamKind::Int | ParamKind::Bool => "",
        }
    }
}

/// Plain copy of every parameter. Used as configuration and as the
/// per-block view the processor works from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectSettings {
    pub voice_shatter: f32,
    pub noise_volume: f32,
    pub noise_shatter: f32,
    pub loss_rate: f32,
    pub loss_model: LossModel,
    pub loss_enabled: bool,
    pub filter_cutoff: f32,
    pub filter_type: FilterTap,
    pub filter_enabled: bool,
}

/// Percentage in [0, 100] to ratio in [0, 1]. NaN maps to 0.
#[inline]
pub fn ratio(percent: f32) -> f32 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent / 100.0).clamp(0.0, 1.0)
}

/// f32 stored as raw bits in an `AtomicU32`.
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Live parameter block shared between the audio thread and control threads.
#[derive(Debug, Default)]
pub struct EffectParameters {
    voice_shatter: AtomicF32,
    noise_volume: AtomicF32,
    noise_shatter: AtomicF32,
    loss_rate: AtomicF32,
    loss_model: AtomicU8,
    loss_enabled: AtomicBool,
    filter_cutoff: AtomicF32,
    filter_type: AtomicU8,
    filter_enabled: AtomicBool,
}

impl EffectParameters {
    pub fn new(settings: &EffectSettings) -> Self {
        Self {
            voice_shatter: AtomicF32::new(settings.voice_shatter),
            noise_volume: AtomicF32::new(settings.noise_volume),
            noise_shatter: AtomicF32::new(settings.noise_shatter),
            loss_rate: AtomicF32::new(settings.loss_rate),
            loss_model: AtomicU8::new(settings.loss_model.ordinal() as u8),
            loss_enabled: AtomicBool::new(settings.loss_enabled),
            filter_cutoff: AtomicF32::new(settings.filter_cutoff),
            filter_type: AtomicU8::new(settings.filter_type.ordinal() as u8),
            filter_enabled: AtomicBool::new(settings.filter_enabled),
        }
    }

    /// Store every field of `settings`.
    pub fn apply(&self, settings: &EffectSettings) {
        self.voice_shatter.store(settings.voice_shatter);
        self.noise_volume.store(settings.noise_volume);
        self.noise_shatter.store(settings.noise_shatter);
        self.loss_rate.store(settings.loss_rate);
        self.loss_model
            .store(settings.loss_model.ordinal() as u8, Ordering::Relaxed);
        self.loss_enabled
            .store(settings.loss_enabled, Ordering::Relaxed);
        self.filter_cutoff.store(settings.filter_cutoff);
        self.filter_type
            .store(settings.filter_type.ordinal() as u8, Ordering::Relaxed);
        self.filter_enabled
            .store(settings.filter_enabled, Ordering::Relaxed);
    }

    /// Back to the reset state: zeros, `Constant`, `Lowpass`, everything off.
    pub fn reset(&self) {
        self.apply(&EffectSettings::default());
    }

    /// Load every field once.
    pub fn snapshot(&self) -> EffectSettings {
        EffectSettings {
            voice_shatter: self.voice_shatter.load(),
            noise_volume: self.noise_volume.load(),
            noise_shatter: self.noise_shatter.load(),
            loss_rate: self.loss_rate.load(),
            loss_model: LossModel::from_ordinal(self.loss_model.load(Ordering::Relaxed) as i32)
                .unwrap_or_default(),
            loss_enabled: self.loss_enabled.load(Ordering::Relaxed),
            filter_cutoff: self.filter_cutoff.load(),
            filter_type: FilterTap::from_ordinal(self.filter_type.load(Ordering::Relaxed) as i32)
                .unwrap_or_default(),
            filter_enabled: self.filter_enabled.load(Ordering::Relaxed),
        }
    }

    /// The single index -> storage table behind the get/set calls.
    fn field(&self, index: usize) -> Option<Field<'_>> {
        let field = match ParamId::from_index(index)? {
            ParamId::VoiceShatter => Field::Float(&self.voice_shatter),
            ParamId::NoiseVolume => Field::Float(&self.noise_volume),
            ParamId::NoiseShatter => Field::Float(&self.noise_shatter),
            ParamId::LossRate => Field::Float(&self.loss_rate),
            ParamId::LossModel => Field::Int(&self.loss_model, |v| {
                LossModel::from_ordinal(v).map(LossModel::ordinal)
            }),
            ParamId::LossEnabled => Field::Bool(&self.loss_enabled),
            ParamId::FilterCutoff => Field::Float(&self.filter_cutoff),
            ParamId::FilterType => Field::Int(&self.filter_type, |v| {
                FilterTap::from_ordinal(v).map(FilterTap::ordinal)
            }),
            ParamId::FilterEnabled => Field::Bool(&self.filter_enabled),
        };
        Some(field)
    }

    pub fn set_float(&self, index: usize, value: f32) -> Result<()> {
        match self.field(index) {
            Some(Field::Float(f)) => {
                f.store(value);
                Ok(())
            }
            _ => Err(invalid(index, ParamKind::Float)),
        }
    }

    pub fn get_float(&self, index: usize) -> Result<f32> {
        match self.field(index) {
            Some(Field::Float(f)) => Ok(f.load()),
            _ => Err(invalid(index, ParamKind::Float)),
        }
    }

    /// Int parameters are enum ordinals; an unknown ordinal is rejected.
    pub fn set_int(&self, index: usize, value: i32) -> Result<()> {
        match self.field(index) {
            Some(Field::Int(f, validate)) => {
                let ordinal = validate(value).ok_or(invalid(index, ParamKind::Int))?;
                f.store(ordinal as u8, Ordering::Relaxed);
                Ok(())
            }
            _ => Err(invalid(index, ParamKind::Int)),
        }
    }

    pub fn get_int(&self, index: usize) -> Result<i32> {
        match self.field(index) {
            Some(Field::Int(f, _)) => Ok(f.load(Ordering::Relaxed) as i32),
            _ => Err(invalid(index, ParamKind::Int)),
        }
    }

    pub fn set_bool(&self, index: usize, value: bool) -> Result<()> {
        match self.field(index) {
            Some(Field::Bool(f)) => {
                f.store(value, Ordering::Relaxed);
                Ok(())
            }
            _ => Err(invalid(index, ParamKind::Bool)),
        }
    }

    pub fn get_bool(&self, index: usize) -> Result<bool> {
        match self.field(index) {
            Some(Field::Bool(f)) => Ok(f.load(Ordering::Relaxed)),
            _ => Err(invalid(index, ParamKind::Bool)),
        }
    }
}

/// Storage slot of one parameter. Int slots carry their ordinal check.
enum Field<'a> {
    Float(&'a AtomicF32),
    Int(&'a AtomicU8, fn(i32) -> Option<i32>),
    Bool(&'a AtomicBool),
}

impl Field<'_> {
    fn kind(&self) -> ParamKind {
        match self {
            Field::Float(_) => ParamKind::Float,
            Field::Int(..) => ParamKind::Int,
            Field::Bool(_) => ParamKind::Bool,
        }
    }
}

fn invalid(index: usize, kind: ParamKind) -> IntrfError {
    IntrfError::InvalidParameter { index, kind }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOATS: [usize; 5] = [0, 1, 2, 3, 6];
    const INTS: [usize; 2] = [4, 7];
    const BOOLS: [usize; 2] = [5, 8];

    #[test]
    fn index_table_matches_host_contract() {
        assert_eq!(ParamId::COUNT, 9);
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ParamId::from_index(i), Some(*id));
        }
        for i in FLOATS {
            assert_eq!(ParamId::ALL[i].kind(), ParamKind::Float);
        }
        for i in INTS {
            assert_eq!(ParamId::ALL[i].kind(), ParamKind::Int);
        }
        for i in BOOLS {
            assert_eq!(ParamId::ALL[i].kind(), ParamKind::Bool);
        }
        assert_eq!(ParamId::from_index(9), None);
    }

    #[test]
    fn storage_table_agrees_with_declared_kinds() {
        let p = EffectParameters::default();
        for id in ParamId::ALL {
            let field = p.field(id.index()).map(|f| f.kind());
            assert_eq!(field, Some(id.kind()), "{id:?}");
        }
        assert!(p.field(ParamId::COUNT).is_none());
    }

    #[test]
    fn float_round_trip() {
        let p = EffectParameters::default();
        for (n, i) in FLOATS.into_iter().enumerate() {
            let v = 12.5 * (n as f32 + 1.0);
            p.set_float(i, v).unwrap();
            assert_eq!(p.get_float(i).unwrap(), v, "index {i}");
        }
    }

    #[test]
    fn int_and_bool_round_trip() {
        let p = EffectParameters::default();
        for i in INTS {
            for v in 0..3 {
                p.set_int(i, v).unwrap();
                assert_eq!(p.get_int(i).unwrap(), v);
            }
        }
        for i in BOOLS {
            p.set_bool(i, true).unwrap();
            assert!(p.get_bool(i).unwrap());
            p.set_bool(i, false).unwrap();
            assert!(!p.get_bool(i).unwrap());
        }
    }

    #[test]
    fn wrong_kind_or_index_is_rejected_without_mutation() {
        let p = EffectParameters::new(&EffectSettings {
            voice_shatter: 40.0,
            loss_enabled: true,
            loss_model: LossModel::Buffer,
            ..Default::default()
        });
        let before = p.snapshot();

        for i in INTS.into_iter().chain(BOOLS).chain([9, 100]) {
            assert_eq!(
                p.set_float(i, 1.0),
                Err(IntrfError::InvalidParameter { index: i, kind: ParamKind::Float })
            );
            assert!(p.get_float(i).is_err());
        }
        for i in FLOATS.into_iter().chain(BOOLS).chain([9]) {
            assert!(p.set_int(i, 1).is_err());
            assert!(p.get_int(i).is_err());
        }
        for i in FLOATS.into_iter().chain(INTS).chain([9]) {
            assert!(p.set_bool(i, false).is_err());
            assert!(p.get_bool(i).is_err());
        }
        assert!(p.set_int(4, 3).is_err(), "unknown ordinal");
        assert!(p.set_int(7, -1).is_err(), "negative ordinal");

        assert_eq!(p.snapshot(), before);
    }

    #[test]
    fn reset_restores_defaults() {
        let p = EffectParameters::default();
        p.set_float(0, 80.0).unwrap();
        p.set_int(7, 2).unwrap();
        p.set_bool(8, true).unwrap();
        p.reset();
        assert_eq!(p.snapshot(), EffectSettings::default());
    }

    #[test]
    fn ratio_clamps() {
        assert_eq!(ratio(50.0), 0.5);
        assert_eq!(ratio(-10.0), 0.0);
        assert_eq!(ratio(250.0), 1.0);
        assert_eq!(ratio(f32::NAN), 0.0);
    }
}
