//! Benchmarks for the record list
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dengue::import::CsvImporter;
use dengue::list::{derive_datasets, filter_records};
use dengue::records::{Record, RecordFields};

const REGIONS: [&str; 4] = ["NCR", "Region VII", "CAR", "Region XI"];

fn create_test_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new(
                format!("doc{}", i),
                RecordFields::new(
                    format!("City {}", i),
                    (i % 250) as u64,
                    (i % 7) as u64,
                    "2023-01-01",
                    REGIONS[i % REGIONS.len()],
                ),
            )
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 10000] {
        let records = create_test_records(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("search_{}", size), |b| {
            b.iter(|| filter_records(black_box(&records), "region vii"))
        });

        group.bench_function(format!("no_search_{}", size), |b| {
            b.iter(|| filter_records(black_box(&records), ""))
        });
    }

    group.finish();
}

fn bench_charts(c: &mut Criterion) {
    let mut group = c.benchmark_group("charts");

    for size in [100, 1000, 10000] {
        let records = create_test_records(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("derive_{}", size), |b| {
            b.iter(|| derive_datasets(black_box(&records)))
        });
    }

    group.finish();
}

fn bench_csv_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv");

    let mut csv_data = String::from("location,cases,deaths,date,regions\n");
    for i in 0..1000 {
        csv_data.push_str(&format!("City {},{},{},01/15/2023,NCR\n", i, i % 250, i % 7));
    }
    let importer = CsvImporter::new();

    group.throughput(Throughput::Elements(1000));
    group.bench_function("parse_1000", |b| {
        b.iter(|| importer.parse_str(black_box(&csv_data)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_filter, bench_charts, bench_csv_parse);
criterion_main!(benches);
