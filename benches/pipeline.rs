//! Benchmarks for LFProc filtering and windowed processing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lfproc::{
    decode_series, encode_series, CatalogEntry, FnReader, LowPass, TimeCatalog, TimeSeries,
    Timestamp, WindowedProcessor,
};

const RAW_DT_US: i64 = 10_000;

fn generate_series(start: Timestamp, samples: usize, channels: usize) -> TimeSeries {
    let data = (0..samples * channels)
        .map(|i| {
            let t = (i / channels) as f32 * 0.01;
            (t * 0.3).sin() + 0.2 * (t * 40.0).sin() + (i % channels) as f32
        })
        .collect();
    TimeSeries::from_regular(start, RAW_DT_US, channels, data).unwrap()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for &n in &[1_000usize, 10_000, 100_000] {
        let lp = LowPass::butterworth(0.45, 100.0).unwrap().unwrap();
        let signal: Vec<f64> = (0..n).map(|i| (i as f64 * 0.01).sin()).collect();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("butterworth_zero_phase", n), &n, |b, _| {
            b.iter(|| {
                let mut x = signal.clone();
                lp.apply(&mut x);
                black_box(x);
            })
        });
    }

    group.finish();
}

fn bench_series_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("series");

    let series = generate_series(Timestamp::from_secs(0), 6_000, 32);
    let targets: Vec<Timestamp> = (0..60).map(Timestamp::from_secs).collect();

    group.bench_function("low_pass_32ch_60s", |b| {
        b.iter(|| black_box(series.low_pass(0.45).unwrap()))
    });

    group.bench_function("resample_nearest_32ch", |b| {
        b.iter(|| {
            black_box(
                series
                    .resample(&targets, lfproc::ResampleMethod::Nearest)
                    .unwrap(),
            )
        })
    });

    let bytes = encode_series(&series);
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("decode_window", |b| {
        b.iter(|| black_box(decode_series(&bytes).unwrap()))
    });

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    // 20 files of 60 s at 100 Hz, 8 channels
    let t0 = Timestamp::from_secs(1_420_070_400);
    let files: Vec<TimeSeries> = (0..20)
        .map(|i| generate_series(t0.offset(i * 60_000_000), 6_000, 8))
        .collect();
    let entries = files
        .iter()
        .enumerate()
        .map(|(i, f)| CatalogEntry::new(i.to_string(), f.time_min(), f.time_max()))
        .collect();
    let catalog = TimeCatalog::new(entries).unwrap();

    group.throughput(Throughput::Elements(1_190));
    group.bench_function("process_20_minutes", |b| {
        b.iter(|| {
            let files = files.clone();
            let reader = FnReader::new(move |r: &str| {
                let idx: usize = r.parse()?;
                Ok(files[idx].clone())
            });
            let dir = tempfile::tempdir().unwrap();
            let mut proc = WindowedProcessor::new(catalog.clone(), Box::new(reader));
            proc.set_output_folder(dir.path(), true).unwrap();
            let summary = proc
                .process_time_range(t0, t0.offset(1_200_000_000))
                .unwrap();
            black_box(summary);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_filter, bench_series_ops, bench_full_run);

criterion_main!(benches);
