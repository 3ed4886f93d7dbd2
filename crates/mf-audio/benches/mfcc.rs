use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use mf_audio::fft::SpectralAnalyzer;
use mf_audio::mel::MelFilterbank;
use mf_audio::pipeline::MfccPipeline;
use mf_core::{MfccConfig, Signal};

fn bench_fft(c: &mut Criterion) {
    let mut fft = SpectralAnalyzer::new(512).unwrap();
    let frame: Vec<f32> = (0..400).map(|i| (i as f32 * 0.173).sin()).collect();
    c.bench_function("power_spectrum_512", |b| {
        b.iter(|| fft.power(black_box(&frame)).unwrap());
    });
}

fn bench_filterbank(c: &mut Criterion) {
    c.bench_function("mel_filterbank_build_26", |b| {
        b.iter(|| MelFilterbank::new(black_box(16_000), 512, 26, 0.0, 8000.0).unwrap());
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let signal = Signal::sine(440.0, 0.5, 10.0, 16_000).unwrap();
    let sequential = MfccPipeline::new(&MfccConfig::default(), 16_000).unwrap();
    let parallel = MfccPipeline::new(
        &MfccConfig {
            parallel: true,
            ..MfccConfig::default()
        },
        16_000,
    )
    .unwrap();

    c.bench_function("mfcc_10s_sequential", |b| {
        b.iter(|| sequential.compute(black_box(&signal)).unwrap());
    });
    c.bench_function("mfcc_10s_parallel", |b| {
        b.iter(|| parallel.compute(black_box(&signal)).unwrap());
    });
}

criterion_group!(benches, bench_fft, bench_filterbank, bench_pipeline);
criterion_main!(benches);
