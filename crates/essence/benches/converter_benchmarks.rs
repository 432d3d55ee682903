//! Conversion performance benchmarks.
//!
//! Measures end-to-end file conversion, with and without a resolver.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use essence::{ColumnTarget, FileSchema, FirstCandidateResolver, RowConverter};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const DESCRIPTIONS: [&str; 4] = [
    "ADP BLU MEDITERRANEO MIRTO DI PANAREA 30ML EDT SPRAY 29.6ml",
    "CHANEL NO 5 100ML EDP SPRAY FOR WOMEN",
    "ACQUA DI GIO ROLL ON 10ML UNISEX",
    "DIOR SAUVAGE 60 ML VAPO POUR HOMME",
];

/// Generate a catalog with a title row and `rows` data rows.
fn generate_catalog(rows: usize) -> String {
    let mut data = String::from("Code,Description,Country\n");
    for row in 0..rows {
        let description = DESCRIPTIONS[row % DESCRIPTIONS.len()];
        data.push_str(&format!("{:013},{},IT\n", 8011003000000u64 + row as u64, description));
    }
    data
}

fn schema() -> FileSchema {
    FileSchema::new()
        .with_title_row(1)
        .map_column(0, ColumnTarget::Code)
        .map_column(2, ColumnTarget::CountryOfOrigin)
        .describe_column(1)
}

/// Benchmark unattended conversion of catalogs of various sizes.
fn bench_convert(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let schema = schema();
    let mut group = c.benchmark_group("convert");

    for rows in [100, 1_000, 10_000].iter() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        let data = generate_catalog(*rows);
        file.write_all(data.as_bytes()).unwrap();

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &file, |b, file| {
            b.iter(|| black_box(converter.convert(file.path(), &schema).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark conversion that consults a resolver on every uncertain field.
fn bench_convert_with_resolver(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let schema = schema();

    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    file.write_all(generate_catalog(1_000).as_bytes()).unwrap();

    c.bench_function("convert_with_resolver", |b| {
        b.iter(|| {
            let mut resolver = FirstCandidateResolver::new();
            black_box(
                converter
                    .convert_interactive(file.path(), &schema, &mut resolver)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_convert, bench_convert_with_resolver);
criterion_main!(benches);
