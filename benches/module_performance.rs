//! Module Performance Benchmarks
//!
//! Per-module `tick` throughput at common sample rates. For real-time audio,
//! a buffer of samples must be processed before the next buffer arrives; the
//! time budget is `buffer_size / sample_rate`, so the per-sample path of
//! every module needs to stay far below one sample period even with every
//! input patched.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grit::prelude::*;

const SAMPLE_RATES: [f64; 3] = [44100.0, 48000.0, 96000.0];

fn bench_bit_crusher(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/bit_crusher");

    for sample_rate in SAMPLE_RATES {
        let sr_name = format!("{}kHz", sample_rate as u32 / 1000);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("tick", &sr_name),
            &sample_rate,
            |b, &sr| {
                let mut crush = BitCrusher::new(sr);
                let mut inputs = PortValues::new();
                inputs.set(BitCrusher::IN_AUDIO, 3.3);
                inputs.set(BitCrusher::IN_AND, 4.0);
                inputs.set(BitCrusher::IN_XOR, 2.0);
                let mut outputs = PortValues::new();

                b.iter(|| {
                    crush.tick(black_box(&inputs), &mut outputs);
                    outputs.voltage(BitCrusher::OUT_AUDIO, 0)
                });
            },
        );
    }

    group.finish();
}

fn bench_bit_crusher_poly(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/bit_crusher_poly");

    let channel_counts = [1usize, 4, 8, 16];
    for channels in channel_counts {
        group.throughput(Throughput::Elements(channels as u64));
        group.bench_with_input(
            BenchmarkId::new("tick", channels),
            &channels,
            |b, &ch| {
                let mut crush = BitCrusher::new(48000.0);
                let voltages: Vec<f64> = (0..ch).map(|c| c as f64 * 0.3 - 2.5).collect();
                let mut inputs = PortValues::new();
                inputs.set_poly(BitCrusher::IN_AUDIO, &voltages);
                let mut outputs = PortValues::new();

                b.iter(|| {
                    crush.tick(black_box(&inputs), &mut outputs);
                    outputs.voltage(BitCrusher::OUT_AUDIO, 0)
                });
            },
        );
    }

    group.finish();
}

fn bench_clip_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/clip_limiter");

    group.throughput(Throughput::Elements(1));
    group.bench_function("tick", |b| {
        let mut clip = ClipLimiter::new();
        let mut inputs = PortValues::new();
        inputs.set(ClipLimiter::IN_AUDIO, 3.0);
        inputs.set(ClipLimiter::IN_PUSH_SIZE, 2.0);
        inputs.set(ClipLimiter::IN_LIMIT_POS, 1.0);
        let mut outputs = PortValues::new();

        b.iter(|| {
            clip.tick(black_box(&inputs), &mut outputs);
            outputs.voltage(ClipLimiter::OUT_AUDIO, 0)
        });
    });

    group.finish();
}

fn bench_clock_divider(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/clock_divider");

    group.throughput(Throughput::Elements(1));
    group.bench_function("tick", |b| {
        let mut div = ClockDivider::new();
        let mut inputs = PortValues::new();
        let mut outputs = PortValues::new();
        let mut high = false;

        b.iter(|| {
            // Alternate the clock so edges and output sweeps both run
            high = !high;
            inputs.set(ClockDivider::IN_CLOCK, if high { 5.0 } else { 0.0 });
            div.tick(black_box(&inputs), &mut outputs);
            outputs.voltage(ClockDivider::OUT_DIV, 0)
        });
    });

    group.finish();
}

fn bench_wave_folder(c: &mut Criterion) {
    let mut group = c.benchmark_group("modules/wave_folder");

    group.throughput(Throughput::Elements(1));
    group.bench_function("tick", |b| {
        let mut fold = WaveFolder::new();
        fold.set_param(WaveFolder::PARAM_FEEDBACK, 0.3);
        fold.set_param(WaveFolder::PARAM_SHAPE, 0.5);
        let mut inputs = PortValues::new();
        inputs.set(WaveFolder::IN_AUDIO, 4.2);
        let mut outputs = PortValues::new();

        b.iter(|| {
            fold.tick(black_box(&inputs), &mut outputs);
            outputs.voltage(WaveFolder::OUT_AUDIO, 0)
        });
    });

    group.finish();
}

fn bench_one_second_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    let sample_rate = 48000.0;
    let one_second_samples = sample_rate as usize;

    // Crush -> fold -> clip, patched by hand the way a host graph would
    group.throughput(Throughput::Elements(one_second_samples as u64));
    group.bench_function("chain_1sec", |b| {
        let mut crush = BitCrusher::new(sample_rate);
        let mut fold = WaveFolder::new();
        let mut clip = ClipLimiter::new();

        let mut crush_in = PortValues::new();
        let mut crush_out = PortValues::new();
        let mut fold_in = PortValues::new();
        let mut fold_out = PortValues::new();
        let mut clip_in = PortValues::new();
        let mut clip_out = PortValues::new();

        b.iter(|| {
            let mut acc = 0.0;
            for n in 0..one_second_samples {
                let source = ((n % 100) as f64 / 100.0 - 0.5) * 10.0;
                crush_in.set(BitCrusher::IN_AUDIO, source);
                crush.tick(&crush_in, &mut crush_out);

                fold_in.set(WaveFolder::IN_AUDIO, crush_out.voltage(BitCrusher::OUT_AUDIO, 0));
                fold.tick(&fold_in, &mut fold_out);

                clip_in.set(ClipLimiter::IN_AUDIO, fold_out.voltage(WaveFolder::OUT_AUDIO, 0));
                clip.tick(&clip_in, &mut clip_out);

                acc += clip_out.voltage(ClipLimiter::OUT_AUDIO, 0);
            }
            black_box(acc)
        });
    });

    group.finish();
}

criterion_group!(
    module_benches,
    bench_bit_crusher,
    bench_bit_crusher_poly,
    bench_clip_limiter,
    bench_clock_divider,
    bench_wave_folder,
);

criterion_group!(throughput_benches, bench_one_second_chain);

criterion_main!(module_benches, throughput_benches);
