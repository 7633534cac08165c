//! Export and simulation benchmarks
//!
//! - Fallback simulation across iteration counts
//! - Rendering each export format
//! - Local cache round trip on disk

use beelab::experiment::{find_dataset, BeeParams, Experiment, ExperimentInput};
use beelab::export::{self, ExportFormat};
use beelab::simulator::LocalSimulator;
use beelab::store::{ExperimentCache, ExperimentStore, LocalStore};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn toy_input() -> ExperimentInput {
    let dataset = find_dataset("toy-9x5").unwrap();
    ExperimentInput::preloaded(dataset.name).with_matrix(dataset.matrix)
}

fn simulated(id: &str, iterations: u32) -> Experiment {
    let params = BeeParams::builder(30, iterations).random_seed(1).build();
    let input = toy_input();
    let response = LocalSimulator::new().simulate(&params, &input);
    Experiment::from_run(
        id,
        "bench",
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        params,
        input,
        response,
    )
}

/// Benchmark the fallback simulator
fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    let input = toy_input();

    for iterations in [100u32, 500, 1000] {
        let params = BeeParams::builder(30, iterations).random_seed(7).build();
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &params,
            |b, params| {
                b.iter(|| LocalSimulator::new().simulate(black_box(params), black_box(&input)));
            },
        );
    }

    group.finish();
}

/// Benchmark each export format on a 1000-iteration experiment
fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let experiment = simulated("bench-export", 1000);

    for format in [ExportFormat::Spreadsheet, ExportFormat::Document, ExportFormat::Csv] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format),
            &format,
            |b, format| {
                b.iter(|| export::export(black_box(&experiment), *format).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark listing and replacing the disk cache
fn bench_local_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = rt.block_on(LocalStore::open(dir.path())).unwrap();
    let experiments: Vec<Experiment> = (0..50)
        .map(|i| simulated(&format!("exp-{i:03}"), 100))
        .collect();
    rt.block_on(store.replace_all(&experiments)).unwrap();

    let mut group = c.benchmark_group("local_store");
    group.sample_size(20);
    group.bench_function("list_50", |b| {
        b.iter(|| rt.block_on(store.list()).unwrap());
    });
    group.bench_function("replace_all_50", |b| {
        b.iter(|| rt.block_on(store.replace_all(black_box(&experiments))).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_simulation, bench_export, bench_local_store);
criterion_main!(benches);
