//! Extraction performance benchmarks.
//!
//! Measures description parsing and candidate collection as the rule set
//! and dictionaries grow.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use essence::rules::{PatternRule, RuleSet};
use essence::{AttributeKind, Extractor};

const LINES: [&str; 6] = [
    "ADP BLU MEDITERRANEO MIRTO DI PANAREA 30ML EDT SPRAY 29.6ml",
    "CHANEL NO 5 100ML EDP SPRAY FOR WOMEN",
    "DIOR SAUVAGE EAU DE TOILETTE 60 ML VAPO POUR HOMME",
    "*NEW* GUCCI BLOOM 3.4 FL OZ EAU DE PARFUM",
    "ACQUA DI GIO ROLL ON 10ML UNISEX",
    "GIFT BOX",
];

/// Default rule set plus `extra` brands and size rules.
fn grown_rule_set(extra: usize) -> RuleSet {
    let mut rules = RuleSet::default();
    rules.brand_name_to_id.insert("CHANEL".to_string(), 1);
    for i in 0..extra {
        rules
            .brand_name_to_id
            .insert(format!("HOUSE {}", i), i as u32 + 2);
        rules.rules.push(
            PatternRule::new(format!("learned_size_{}", i + 1), format!(r"(\d+)\s*U{}\b", i), AttributeKind::Size)
                .with_value("ml")
                .with_priority(5)
                .stop_on_match(),
        );
    }
    rules
}

/// Benchmark parsing representative catalog lines.
fn bench_parse_description(c: &mut Criterion) {
    let extractor = Extractor::new(Arc::new(grown_rule_set(0))).unwrap();
    let mut group = c.benchmark_group("parse_description");

    for (i, line) in LINES.iter().enumerate() {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::new("line", i), line, |b, line| {
            b.iter(|| black_box(extractor.parse_description(line)))
        });
    }

    group.finish();
}

/// Benchmark parsing as taught rules and brands accumulate.
fn bench_rule_set_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_set_scaling");

    for extra in [0, 10, 100, 500].iter() {
        let extractor = Extractor::new(Arc::new(grown_rule_set(*extra))).unwrap();
        group.bench_with_input(BenchmarkId::new("extra_rules", extra), &extractor, |b, ex| {
            b.iter(|| {
                for line in LINES {
                    black_box(ex.parse_description(line));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark candidate collection, which ignores first-success precedence.
fn bench_candidates(c: &mut Criterion) {
    let extractor = Extractor::new(Arc::new(grown_rule_set(10))).unwrap();

    c.bench_function("candidates", |b| {
        b.iter(|| {
            for line in LINES {
                black_box(extractor.candidates(line));
            }
        })
    });
}

/// Benchmark compiling a rule set, paid after every runtime mutation.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for extra in [0, 100].iter() {
        let rules = Arc::new(grown_rule_set(*extra));
        group.bench_with_input(BenchmarkId::new("extra_rules", extra), &rules, |b, rules| {
            b.iter(|| black_box(Extractor::new(Arc::clone(rules)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_description,
    bench_rule_set_scaling,
    bench_candidates,
    bench_compile,
);
criterion_main!(benches);
