//! End-to-end behaviour of the compressor engines.

use std::f64::consts::PI;

use pressor_core::{ParameterInfo, db_to_power, linear_to_db};
use pressor_engine::{
    Channel, ChannelControl, ChannelEngine, SideChainEngine, SideChainParam, StereoEngine,
    StereoParam,
};

const SAMPLE_RATE: f64 = 48000.0;

fn sine(amplitude: f64, freq: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE).sin())
        .collect()
}

fn rms(x: &[f64]) -> f64 {
    (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
}

fn sidechain(params: &[(SideChainParam, f64)]) -> SideChainEngine {
    let mut engine = SideChainEngine::new(SAMPLE_RATE, 512).unwrap();
    for &(param, value) in params {
        engine.on_parameter_changed(param.index(), value);
    }
    engine
}

#[test]
fn settled_gain_reduction_matches_static_curve() {
    let mut engine = sidechain(&[
        (SideChainParam::Attack, 10.0),
        (SideChainParam::Release, 10.0),
        (SideChainParam::Threshold, -20.0),
        (SideChainParam::Ratio, 4.0),
        (SideChainParam::Softness, 0.0),
        (SideChainParam::Makeup, 0.0),
        (SideChainParam::DryWet, 1.0),
    ]);
    // Mean power 12 dB above the threshold: A²/2 = 10^(-8/10).
    let amplitude = (2.0 * db_to_power(-8.0)).sqrt();
    let len = 24000;
    let input = sine(amplitude, 1000.0, len);
    let mut output = vec![0.0; len];
    engine.process(&[&input[..]], &mut [&mut output[..]]).unwrap();

    let tail = len - 480..len;
    let reduction = -linear_to_db(rms(&output[tail.clone()]) / rms(&input[tail]));
    assert!((reduction - 9.0).abs() < 0.5, "gain reduction {reduction} dB");
    assert!((engine.gain_reduction_db() + 9.0).abs() < 0.5);
}

#[test]
fn missing_sidechain_equals_main_on_both_inputs() {
    let params = [
        (SideChainParam::Threshold, -30.0),
        (SideChainParam::Ratio, 6.0),
        (SideChainParam::LowCut, 200.0),
    ];
    let mut mono = sidechain(&params);
    let mut doubled = sidechain(&params);
    let input = sine(0.7, 440.0, 4000);
    let mut out_mono = vec![0.0; 4000];
    let mut out_doubled = vec![0.0; 4000];
    mono.process(&[&input[..]], &mut [&mut out_mono[..]]).unwrap();
    doubled
        .process(&[&input[..], &input[..]], &mut [&mut out_doubled[..]])
        .unwrap();
    assert_eq!(out_mono, out_doubled);
}

#[test]
fn sidechain_key_controls_main_level() {
    let mut engine = sidechain(&[
        (SideChainParam::Threshold, -30.0),
        (SideChainParam::Ratio, 10.0),
    ]);
    let len = 24000;
    let main = sine(0.05, 440.0, len);
    let key = sine(0.9, 1000.0, len);
    let mut out = vec![0.0; len];
    engine.process(&[&main[..], &key[..]], &mut [&mut out[..]]).unwrap();
    let tail = len / 2..len;
    assert!(rms(&out[tail.clone()]) < 0.2 * rms(&main[tail]));
}

#[test]
fn attack_control_drives_gain_recovery() {
    let mut engine = sidechain(&[
        (SideChainParam::Attack, 1.0),
        (SideChainParam::Release, 100.0),
        (SideChainParam::Threshold, -40.0),
        (SideChainParam::Ratio, 100.0),
        (SideChainParam::Softness, -4.0),
    ]);
    let onset = sine(1.0, 1000.0, 480);
    let mut out = vec![0.0; 480];
    engine.process(&[&onset[..]], &mut [&mut out[..]]).unwrap();
    // 100 ms governs the falling gain: little reduction after 10 ms.
    assert!(engine.gain_reduction_db() > -6.0, "{}", engine.gain_reduction_db());

    let sustained = sine(1.0, 1000.0, 48000);
    let mut out = vec![0.0; 48000];
    engine.process(&[&sustained[..]], &mut [&mut out[..]]).unwrap();
    assert!(engine.gain_reduction_db() < -20.0);

    let silence = vec![0.0; 1440];
    let mut out = vec![0.0; 1440];
    engine.process(&[&silence[..]], &mut [&mut out[..]]).unwrap();
    // 1 ms governs the rising gain: recovered 30 ms after the key stops.
    assert!(engine.gain_reduction_db() > -1.0, "{}", engine.gain_reduction_db());
}

#[test]
fn host_blocks_longer_than_max_are_chunked() {
    let mut whole = sidechain(&[(SideChainParam::Threshold, -25.0)]);
    let mut small = SideChainEngine::new(SAMPLE_RATE, 37).unwrap();
    small.on_parameter_changed(SideChainParam::Threshold.index(), -25.0);
    let input = sine(0.8, 700.0, 2000);
    let mut a = vec![0.0; 2000];
    let mut b = vec![0.0; 2000];
    whole.process(&[&input[..]], &mut [&mut a[..]]).unwrap();
    small.process(&[&input[..]], &mut [&mut b[..]]).unwrap();
    assert_eq!(a, b);
}

fn stereo(params: &[(StereoParam, f64)]) -> StereoEngine {
    let mut engine = StereoEngine::new(SAMPLE_RATE, 256).unwrap();
    for &(param, value) in params {
        engine.on_parameter_changed(param.index(), value);
    }
    engine
}

fn run_stereo(engine: &mut StereoEngine, left: &[f64], right: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut out_l = vec![0.0; left.len()];
    let mut out_r = vec![0.0; right.len()];
    engine
        .process(&[left, right], &mut [&mut out_l[..], &mut out_r[..]])
        .unwrap();
    (out_l, out_r)
}

#[test]
fn linked_channels_share_one_gain() {
    let mut engine = stereo(&[
        (StereoParam::Link, 1.0),
        (StereoParam::Channel(Channel::One, ChannelControl::Threshold), -10.0),
        (StereoParam::Channel(Channel::Two, ChannelControl::Threshold), -30.0),
        (StereoParam::Channel(Channel::One, ChannelControl::Ratio), 4.0),
    ]);
    let len = 9600;
    let left = sine(0.8, 1000.0, len);
    let right = sine(0.3, 330.0, len);
    let (out_l, out_r) = run_stereo(&mut engine, &left, &right);

    let mut compared = 0;
    for i in 0..len {
        if left[i].abs() > 1e-3 && right[i].abs() > 1e-3 {
            let gain_l = out_l[i] / left[i];
            let gain_r = out_r[i] / right[i];
            assert!((gain_l - gain_r).abs() < 1e-12, "sample {i}: {gain_l} vs {gain_r}");
            compared += 1;
        }
    }
    assert!(compared > len / 2);
    assert!(rms(&out_l[len / 2..]) < rms(&left[len / 2..]));
    assert_eq!(
        engine.gain_reduction_db(Channel::One),
        engine.gain_reduction_db(Channel::Two)
    );
}

#[test]
fn linked_ignores_channel_two_detector_controls() {
    let len = 4800;
    let left = sine(0.8, 1000.0, len);
    let right = sine(0.5, 440.0, len);
    let render = |threshold: f64, ratio: f64| {
        let mut engine = stereo(&[
            (StereoParam::Link, 1.0),
            (StereoParam::Channel(Channel::One, ChannelControl::Threshold), -20.0),
            (StereoParam::Channel(Channel::One, ChannelControl::Ratio), 4.0),
            (StereoParam::Channel(Channel::Two, ChannelControl::Threshold), threshold),
            (StereoParam::Channel(Channel::Two, ChannelControl::Ratio), ratio),
        ]);
        run_stereo(&mut engine, &left, &right)
    };

    let (hard_l, hard_r) = render(-30.0, 50.0);
    let (soft_l, soft_r) = render(0.0, 1.0);
    assert_eq!(hard_l, soft_l);
    assert_eq!(hard_r, soft_r);
    assert!(rms(&hard_l[len / 2..]) < rms(&left[len / 2..]));
}

#[test]
fn unlinked_channels_compress_independently() {
    let mut engine = stereo(&[
        (StereoParam::Channel(Channel::One, ChannelControl::Threshold), -30.0),
        (StereoParam::Channel(Channel::One, ChannelControl::Ratio), 8.0),
    ]);
    let len = 9600;
    let left = sine(0.8, 1000.0, len);
    let right = sine(0.8, 1000.0, len);
    let (out_l, out_r) = run_stereo(&mut engine, &left, &right);
    // Channel 2 keeps the 0 dB threshold and is barely touched.
    assert!(rms(&out_l[len / 2..]) < 0.5 * rms(&out_r[len / 2..]));
    assert!(engine.gain_reduction_db(Channel::One) < engine.gain_reduction_db(Channel::Two));
}

#[test]
fn mid_side_with_inactive_channels_is_transparent() {
    let mut engine = stereo(&[
        (StereoParam::MidSide, 1.0),
        (StereoParam::Active(Channel::One), 0.0),
        (StereoParam::Active(Channel::Two), 0.0),
    ]);
    let left = sine(0.6, 440.0, 1000);
    let right = sine(0.4, 660.0, 1000);
    let (out_l, out_r) = run_stereo(&mut engine, &left, &right);
    for i in 0..1000 {
        assert!((out_l[i] - left[i]).abs() <= 1e-9 * left[i].abs().max(1e-3));
        assert!((out_r[i] - right[i]).abs() <= 1e-9 * right[i].abs().max(1e-3));
    }
}

#[test]
fn mid_side_compresses_only_the_active_component() {
    // Identical channels have no side: compressing side only leaves them alone.
    let mut engine = stereo(&[
        (StereoParam::MidSide, 1.0),
        (StereoParam::Active(Channel::One), 0.0),
        (StereoParam::Channel(Channel::Two, ChannelControl::Threshold), -40.0),
        (StereoParam::Channel(Channel::Two, ChannelControl::Ratio), 20.0),
    ]);
    let signal = sine(0.9, 440.0, 4800);
    let (out_l, out_r) = run_stereo(&mut engine, &signal, &signal);
    for i in 0..4800 {
        assert!((out_l[i] - signal[i]).abs() < 1e-9);
        assert!((out_r[i] - signal[i]).abs() < 1e-9);
    }
}

#[test]
fn dry_mix_returns_raw_input() {
    let mut engine = stereo(&[
        (StereoParam::MidSide, 1.0),
        (StereoParam::Channel(Channel::One, ChannelControl::Threshold), -40.0),
        (StereoParam::DryWet, 0.0),
    ]);
    let left = sine(0.9, 440.0, 2000);
    let right = sine(0.2, 880.0, 2000);
    let (out_l, out_r) = run_stereo(&mut engine, &left, &right);
    assert_eq!(out_l, left);
    assert_eq!(out_r, right);
}

#[test]
fn engines_describe_their_parameters() {
    let sc = SideChainEngine::new(SAMPLE_RATE, 64).unwrap();
    assert_eq!(sc.param_count(), 9);
    assert_eq!(sc.find_param_by_string_id("sc_threshold"), Some(4));
    assert_eq!(sc.get_param(SideChainParam::HighCut.index()), 2000.0);

    let st = StereoEngine::new(SAMPLE_RATE, 64).unwrap();
    assert_eq!(st.param_count(), 17);
    assert_eq!(st.find_param_by_string_id("st_makeup_2"), Some(15));
    assert_eq!(st.get_param(StereoParam::Active(Channel::Two).index()), 1.0);
}
