//! Block-level scenarios driven through the host boundary.

use intrf_engine::{
    FilterTap, Instance, IntrfError, LossModel, ParamId, ParamKind, Prng, RandomSource,
};

const BLOCK: usize = 256;

fn instance(block: usize, channels: usize) -> Instance {
    Instance::create_with_rng(block, channels, Prng::seeded(0x1f2e)).unwrap()
}

fn sine(frames: usize, channels: usize) -> Vec<f32> {
    (0..frames * channels)
        .map(|i| ((i / channels) as f32 * 0.05).sin() * 0.8)
        .collect()
}

#[test]
fn neutral_instance_is_transparent() {
    let mut inst = instance(4, 1);
    let input = [1.0, -1.0, 0.5, -0.5];
    let mut out = [9.0; 4];
    inst.process(&input, &mut out, 1, 4).unwrap();
    assert_eq!(out, input);
}

#[test]
fn full_loss_silences_every_model() {
    for model in LossModel::ALL {
        let mut inst = instance(BLOCK, 2);
        inst.set_parameter_float(ParamId::LossRate.index(), 100.0).unwrap();
        inst.set_parameter_bool(ParamId::LossEnabled.index(), true).unwrap();
        inst.set_parameter_int(ParamId::LossModel.index(), model.ordinal()).unwrap();

        let input = sine(BLOCK, 2);
        let mut out = vec![1.0; input.len()];
        for _ in 0..4 {
            inst.process(&input, &mut out, 2, BLOCK).unwrap();
            assert!(out.iter().all(|&s| s == 0.0), "{model:?} leaked signal");
        }
    }
}

#[test]
fn zero_loss_keeps_every_sample() {
    for model in LossModel::ALL {
        let mut inst = instance(BLOCK, 1);
        inst.set_parameter_bool(ParamId::LossEnabled.index(), true).unwrap();
        inst.set_parameter_int(ParamId::LossModel.index(), model.ordinal()).unwrap();
        let input = vec![0.5; BLOCK];
        let mut out = vec![0.0; BLOCK];
        inst.process(&input, &mut out, 1, BLOCK).unwrap();
        assert_eq!(out, input, "{model:?}");
    }
}

#[test]
fn constant_loss_is_repeatable() {
    let mut inst = instance(16, 1);
    inst.set_parameter_float(3, 50.0).unwrap();
    inst.set_parameter_bool(5, true).unwrap();
    let input = [1.0; 16];
    let mut first = [0.0; 16];
    let mut second = [0.0; 16];
    inst.process(&input, &mut first, 1, 16).unwrap();
    inst.process(&input, &mut second, 1, 16).unwrap();
    assert_eq!(first, second);
    for (i, s) in first.iter().enumerate() {
        assert_eq!(*s, if i % 2 == 0 { 1.0 } else { 0.0 }, "index {i}");
    }
}

#[test]
fn whole_percent_loss_rates_keep_their_period() {
    for (rate, period) in [(90.0, 10), (95.0, 20), (96.0, 25)] {
        let mut inst = instance(BLOCK, 1);
        inst.set_parameter_float(3, rate).unwrap();
        inst.set_parameter_bool(5, true).unwrap();
        let input = vec![1.0; BLOCK];
        let mut out = vec![0.0; BLOCK];
        inst.process(&input, &mut out, 1, BLOCK).unwrap();
        for (i, s) in out.iter().enumerate() {
            assert_eq!(*s, if i % period == 0 { 1.0 } else { 0.0 }, "{rate} %, index {i}");
        }
    }
}

#[test]
fn buffer_loss_is_periodic_within_each_block() {
    let mut inst = instance(BLOCK, 1);
    inst.set_parameter_float(3, 87.5).unwrap();
    inst.set_parameter_bool(5, true).unwrap();
    inst.set_parameter_int(4, LossModel::Buffer.ordinal()).unwrap();

    let input = vec![1.0; BLOCK];
    let mut out = vec![0.0; BLOCK];
    for _ in 0..20 {
        inst.process(&input, &mut out, 1, BLOCK).unwrap();
        assert_eq!(out[0], 1.0);
        let period = out[1..].iter().position(|&s| s != 0.0).map_or(BLOCK, |p| p + 1);
        assert!(period <= 8, "period {period}");
        for (i, s) in out.iter().enumerate() {
            assert_eq!(*s != 0.0, i % period == 0, "index {i}, period {period}");
        }
    }
}

#[test]
fn lowpass_at_full_cutoff_converges_in_two_samples() {
    let mut inst = instance(4, 1);
    inst.set_parameter_bool(ParamId::FilterEnabled.index(), true).unwrap();
    inst.set_parameter_float(ParamId::FilterCutoff.index(), 100.0).unwrap();
    inst.set_parameter_int(ParamId::FilterType.index(), FilterTap::Lowpass.ordinal()).unwrap();

    let c = 0.42;
    let mut out = [0.0; 2];
    inst.process(&[c, c], &mut out, 1, 2).unwrap();
    assert_eq!(out, [c, c]);
}

#[test]
fn highpass_removes_dc() {
    let mut inst = instance(BLOCK, 1);
    inst.set_parameter_bool(8, true).unwrap();
    inst.set_parameter_float(6, 20.0).unwrap();
    inst.set_parameter_int(7, FilterTap::Highpass.ordinal()).unwrap();

    let input = vec![0.7; BLOCK];
    let mut out = vec![0.0; BLOCK];
    for _ in 0..4 {
        inst.process(&input, &mut out, 1, BLOCK).unwrap();
    }
    assert!(out.iter().all(|s| s.abs() < 1e-4), "residual {}", out[BLOCK - 1]);
}

#[test]
fn stereo_channels_filter_independently() {
    let mut inst = instance(BLOCK, 2);
    inst.set_parameter_bool(8, true).unwrap();
    inst.set_parameter_float(6, 10.0).unwrap();

    // Left: DC, right: silence
    let input: Vec<f32> = (0..BLOCK * 2).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let mut out = vec![0.0; input.len()];
    inst.process(&input, &mut out, 2, BLOCK).unwrap();
    assert!(out[BLOCK * 2 - 2] > 0.9);
    assert!(out.iter().skip(1).step_by(2).all(|&s| s == 0.0));
}

#[test]
fn noise_and_shatter_stay_bounded() {
    let mut inst = instance(BLOCK, 2);
    for (index, value) in [(0, 100.0), (1, 100.0), (2, 100.0)] {
        inst.set_parameter_float(index, value).unwrap();
    }
    let input = sine(BLOCK, 2);
    let mut out = vec![0.0; input.len()];
    for _ in 0..50 {
        inst.process(&input, &mut out, 2, BLOCK).unwrap();
        for (o, x) in out.iter().zip(&input) {
            // voice factor <= 2, noise <= 0.02 * 2
            assert!((o - x).abs() <= x.abs() + 0.04 + 1e-6);
        }
    }
}

#[test]
fn noise_only_on_silence_has_expected_level() {
    let mut inst = instance(BLOCK, 1);
    inst.set_parameter_float(1, 100.0).unwrap();
    let input = vec![0.0; BLOCK];
    let mut out = vec![0.0; BLOCK];
    let mut sum_sq = 0.0_f64;
    let blocks = 200;
    for _ in 0..blocks {
        inst.process(&input, &mut out, 1, BLOCK).unwrap();
        sum_sq += out.iter().map(|&s| (s as f64).powi(2)).sum::<f64>();
    }
    let rms = (sum_sq / (blocks * BLOCK) as f64).sqrt();
    // Uniform in [-0.02, 0.02): rms = 0.02 / sqrt(3)
    let expected = 0.02 / 3.0_f64.sqrt();
    assert!((rms - expected).abs() < expected * 0.05, "rms={rms}");
}

#[test]
fn monitor_mirrors_output() {
    let mut inst = instance(BLOCK, 2);
    inst.set_parameter_float(1, 50.0).unwrap();
    let input = sine(BLOCK, 2);
    let mut out = vec![0.0; input.len()];
    inst.process(&input, &mut out, 2, BLOCK).unwrap();
    let snap = inst.monitor_snapshot().unwrap();
    assert_eq!(snap.samples(), &out[..]);
    assert_eq!(snap.frames(), BLOCK);
    let peak = out.iter().step_by(2).fold(0.0_f32, |m, s| m.max(s.abs()));
    assert_eq!(snap.peak(0), peak);
}

#[test]
fn invalid_indices_leave_parameters_alone() {
    let mut inst = instance(4, 1);
    inst.set_parameter_float(0, 25.0).unwrap();
    let before: Vec<f32> = [0, 1, 2, 3, 6]
        .iter()
        .map(|&i| inst.get_parameter_float(i).unwrap())
        .collect();

    assert_eq!(
        inst.set_parameter_float(9, 1.0),
        Err(IntrfError::InvalidParameter { index: 9, kind: ParamKind::Float })
    );
    assert_eq!(
        inst.set_parameter_float(4, 1.0),
        Err(IntrfError::InvalidParameter { index: 4, kind: ParamKind::Float })
    );
    assert!(inst.set_parameter_int(0, 1).is_err());
    assert!(inst.set_parameter_bool(7, true).is_err());
    assert!(inst.get_parameter_bool(usize::MAX).is_err());

    let after: Vec<f32> = [0, 1, 2, 3, 6]
        .iter()
        .map(|&i| inst.get_parameter_float(i).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(inst.get_parameter_int(4).unwrap(), 0);
    assert!(!inst.get_parameter_bool(5).unwrap());
}

#[test]
fn injected_source_drives_shatter() {
    struct Half;
    impl RandomSource for Half {
        fn uniform(&mut self) -> f32 {
            0.5
        }
        fn bounded(&mut self, _max: u32) -> u32 {
            0
        }
    }

    let mut inst = Instance::create_with_rng(4, 1, Half).unwrap();
    inst.set_parameter_float(0, 100.0).unwrap();
    let mut out = [0.0; 4];
    inst.process(&[0.8; 4], &mut out, 1, 4).unwrap();
    // 1 - 0.5 * 1.0
    assert_eq!(out, [0.4; 4]);
}

#[test]
fn released_instance_fails_processing() {
    let mut inst = instance(4, 1);
    inst.release();
    let mut out = [0.0; 4];
    assert_eq!(inst.process(&[0.0; 4], &mut out, 1, 4), Err(IntrfError::InvalidState));
}
