//! Performance benchmarks for generalizer-lib
//!
//! Run with: cargo bench --package generalizer-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use generalizer_lib::{
    CancellationToken, ClusteredVisualization, ConfigValue, ConfigurationStore, Dataset, Feature,
    PipelineConfig, ValueRef, cluster_points, render_pass, visibility,
};
use geo::Point;

/// Generate a dataset of towns scattered in clumps over a 100 km square
fn generate_towns(num_points: usize) -> Dataset {
    let features = (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            let clump = (i % 97) as f64;
            let x = clump * 1_000.0 + (t * 5_000.0).sin() * 400.0;
            let y = (i % 89) as f64 * 1_100.0 + (t * 3_000.0).cos() * 400.0;
            Feature::new(i as u64, Point::new(x, y)).with_attribute("population", ((i * 7919) % 100_000) as f64)
        })
        .collect();
    Dataset::from_features("towns", features).unwrap()
}

fn create_store() -> ConfigurationStore {
    let mut store = ConfigurationStore::default();
    store.add_tag("towns");
    store.set_variable("towns", "_zoom_min", ConfigValue::Number(8.0)).unwrap();
    store.set_variable("towns", "_zoom_max", ConfigValue::Number(14.0)).unwrap();
    store
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    group.sample_size(20);

    for size in [10_000, 50_000] {
        let points = generate_towns(size).points();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("single_level", size), &points, |b, points| {
            b.iter(|| cluster_points(points, 0, 500.0).unwrap());
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let dataset = generate_towns(20_000);
    let pipeline = ClusteredVisualization::new(PipelineConfig {
        base_distance: 4_000.0,
        zoom_levels: 6,
        election_attribute: "population".to_string(),
        ..Default::default()
    })
    .unwrap();

    group.throughput(Throughput::Elements(dataset.len() as u64));
    group.bench_function("6_levels_20k", |b| {
        b.iter(|| pipeline.run(&dataset, &CancellationToken::new()).unwrap());
    });

    group.finish();
}

fn bench_render_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_pass");

    let dataset = generate_towns(50_000);
    let store = create_store();
    let percentiles: ValueRef<Vec<f64>> = vec![1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0].into();
    let min_zoom: ValueRef<f64> = "_zoom_min".into();
    let max_zoom: ValueRef<f64> = "_zoom_max".into();

    group.throughput(Throughput::Elements(dataset.len() as u64));
    group.bench_function("percentile_array_50k", |b| {
        b.iter(|| {
            render_pass(&dataset, &store, 10, |context, feature| {
                visibility::visible_by_percentile_array(
                    context,
                    feature,
                    &min_zoom,
                    &max_zoom,
                    "population",
                    &percentiles,
                )
            })
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_clustering, bench_pipeline, bench_render_pass);

criterion_main!(benches);
