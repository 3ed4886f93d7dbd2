use mf_audio::frames::expected_frame_count;
use mf_audio::pipeline::MfccPipeline;
use mf_core::config::{EdgePolicy, MfccConfig, Span, SpectrumKind};
use mf_core::signal::Signal;

const SR: u32 = 16_000;

fn multitone(gain: f32) -> Signal {
    let n = SR as usize / 2;
    let samples = (0..n)
        .map(|i| {
            let t = i as f32 / SR as f32;
            gain * (0.5 * (std::f32::consts::TAU * 440.0 * t).sin()
                + 0.3 * (std::f32::consts::TAU * 1500.0 * t).sin()
                + 0.2 * (std::f32::consts::TAU * 3200.0 * t).sin())
        })
        .collect();
    Signal::mono(samples, SR).unwrap()
}

#[test]
fn sine_440_end_to_end() {
    let config = MfccConfig {
        frame_length: Span::Ms(25.0),
        hop_length: Span::Ms(10.0),
        fft_size: 512,
        num_filters: 26,
        num_coeffs: 13,
        ..MfccConfig::default()
    };
    let pipeline = MfccPipeline::new(&config, SR).unwrap();
    let tone = Signal::sine(440.0, 0.5, 1.0, SR).unwrap();

    let mfcc = pipeline.compute(&tone).unwrap();
    assert_eq!(mfcc.len(), 99);
    assert!(mfcc.iter().all(|row| row.len() == 13));
    assert!(mfcc.is_finite());

    let fbank = pipeline.log_mel_energies(&tone).unwrap();
    let bank = pipeline.filterbank();
    let near = (0..bank.len())
        .min_by(|&a, &b| {
            let da = (bank.center_hz(a).unwrap() - 440.0).abs();
            let db = (bank.center_hz(b).unwrap() - 440.0).abs();
            da.total_cmp(&db)
        })
        .unwrap();
    let far: Vec<usize> = (0..bank.len())
        .filter(|&m| bank.center_hz(m).unwrap() > 3000.0)
        .collect();
    assert!(!far.is_empty());

    for (t, row) in fbank.iter().enumerate() {
        for &m in &far {
            assert!(
                row[near] > row[m] + 5.0,
                "frame {t}: bande {near} ({}) vs bande {m} ({})",
                row[near],
                row[m]
            );
        }
    }
}

#[test]
fn frame_count_and_width_follow_configuration() {
    let cases = [
        (Span::Ms(25.0), Span::Ms(10.0), EdgePolicy::Pad, 13),
        (Span::Ms(25.0), Span::Ms(10.0), EdgePolicy::Drop, 13),
        (Span::Samples(512), Span::Samples(256), EdgePolicy::Pad, 20),
        (Span::Samples(300), Span::Samples(77), EdgePolicy::Drop, 1),
    ];
    let signal = Signal::sine(1000.0, 0.25, 0.73, SR).unwrap();
    for (frame, hop, policy, k) in cases {
        let config = MfccConfig {
            frame_length: frame,
            hop_length: hop,
            edge_policy: policy,
            num_coeffs: k,
            ..MfccConfig::default()
        };
        let pipeline = MfccPipeline::new(&config, SR).unwrap();
        let geo = pipeline.geometry();
        let m = pipeline.compute(&signal).unwrap();
        assert_eq!(
            m.len(),
            expected_frame_count(signal.len(), geo.frame_len, geo.hop_len, policy)
        );
        assert!(m.iter().all(|row| row.len() == k));
    }
}

#[test]
fn silence_yields_finite_floor_coefficients() {
    let config = MfccConfig {
        lifter: 0.0,
        ..MfccConfig::default()
    };
    let pipeline = MfccPipeline::new(&config, SR).unwrap();
    let silence = Signal::silence(0.5, SR).unwrap();
    let m = pipeline.compute(&silence).unwrap();

    assert!(m.is_finite());
    let expected_c0 = (26.0f32).sqrt() * config.log_floor.ln();
    for row in m.iter() {
        assert!((row[0] - expected_c0).abs() < 1e-2);
        assert!(row[1..].iter().all(|c| c.abs() < 1e-3));
    }

    let spectrogram = pipeline.log_spectrogram(&silence).unwrap();
    assert!(spectrogram.is_finite());
    assert!(spectrogram.as_slice().iter().all(|v| (v + 10.0).abs() < 1e-4));
}

#[test]
fn amplitude_scaling_only_shifts_c0() {
    let pipeline = MfccPipeline::new(&MfccConfig::default(), SR).unwrap();
    let factor = 10.0f32;
    let base = pipeline.compute(&multitone(0.05)).unwrap();
    let loud = pipeline.compute(&multitone(0.05).scaled(factor)).unwrap();

    // Power spectrum, orthonormal DCT: every ln band energy moves by 2 ln(a).
    let expected_shift = (26.0f32).sqrt() * 2.0 * factor.ln();
    for (a, b) in base.iter().zip(loud.iter()) {
        assert!(
            (b[0] - a[0] - expected_shift).abs() < 1e-2,
            "Δc0 = {}",
            b[0] - a[0]
        );
        for k in 1..a.len() {
            assert!((b[k] - a[k]).abs() < 1e-2, "c{k}: {} vs {}", a[k], b[k]);
        }
    }
}

#[test]
fn magnitude_spectrum_halves_the_c0_shift() {
    let config = MfccConfig {
        spectrum: SpectrumKind::Magnitude,
        ..MfccConfig::default()
    };
    let pipeline = MfccPipeline::new(&config, SR).unwrap();
    let base = pipeline.compute(&multitone(0.05)).unwrap();
    let loud = pipeline.compute(&multitone(0.05).scaled(4.0)).unwrap();
    let expected_shift = (26.0f32).sqrt() * 4.0f32.ln();
    for (a, b) in base.iter().zip(loud.iter()) {
        assert!((b[0] - a[0] - expected_shift).abs() < 1e-2);
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let pipeline = MfccPipeline::new(&MfccConfig::default(), SR).unwrap();
    let signal = multitone(0.3);
    assert_eq!(
        pipeline.compute(&signal).unwrap(),
        pipeline.compute(&signal).unwrap()
    );
}

#[test]
fn parallel_run_matches_sequential_order() {
    let signal = multitone(0.3);
    let sequential = MfccPipeline::new(&MfccConfig::default(), SR).unwrap();
    let parallel = MfccPipeline::new(
        &MfccConfig {
            parallel: true,
            ..MfccConfig::default()
        },
        SR,
    )
    .unwrap();
    assert_eq!(
        sequential.compute(&signal).unwrap(),
        parallel.compute(&signal).unwrap()
    );
    assert_eq!(
        sequential.log_mel_energies(&signal).unwrap(),
        parallel.log_mel_energies(&signal).unwrap()
    );
}

#[test]
fn conditioning_options_keep_output_finite() {
    let config = MfccConfig {
        remove_dc_offset: true,
        preemphasis: 0.97,
        low_freq: 20.0,
        high_freq: Some(7600.0),
        num_filters: 40,
        delta_order: 1,
        ..MfccConfig::default()
    };
    let pipeline = MfccPipeline::new(&config, SR).unwrap();
    let offset: Vec<f32> = multitone(0.2).samples().iter().map(|s| s + 0.3).collect();
    let m = pipeline.compute(&Signal::mono(offset, SR).unwrap()).unwrap();
    assert_eq!(m.width(), 26);
    assert!(m.is_finite());
}
