//! Benchmarks for the translation pipeline
//!
//! These benchmarks measure rewrite, validation and emission cost on
//! generated documentation records of growing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docshape_core::{Config, EmitFormat};
use docshape_engine::Translator;
use docshape_rules::RuleSet;

/// Generate a documentation record with N fields, cycling through the
/// notations the rule table knows
fn generate_document(num_fields: usize) -> String {
    let mut lines = vec!["{".to_string()];

    for i in 0..num_fields {
        let line = match i % 8 {
            0 => format!("  \"title{}\": String,", i),
            1 => format!("  \"count{}\": Number, // Integer", i),
            2 => format!("  \"published{}\": Int64, // Unix timestamp", i),
            3 => format!("  \"page{}\": Int32?,", i),
            4 => format!("  \"thumbs{}\": Thumbnail[],", i),
            5 => format!("  \"status{}\": \"active\", // Constant", i),
            6 => format!("  \"items{}\": [],", i),
            _ => format!(
                "  \"nested{}\": {{\n    \"url\": String,\n    \"width\": Int32\n  }},",
                i
            ),
        };
        lines.push(line);
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Benchmark: rewrite passes only
fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let rules = RuleSet::standard().unwrap();

    for num_fields in [10, 100, 1000].iter() {
        let document = generate_document(*num_fields);

        group.bench_with_input(BenchmarkId::from_parameter(num_fields), num_fields, |b, _| {
            b.iter(|| black_box(rules.apply(&document).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark: full translation, canonical and Rust output
fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    let document = generate_document(200);

    let canonical = Translator::new(Config::default()).unwrap();
    group.bench_function("canonical", |b| {
        b.iter(|| black_box(canonical.translate(&document, None).unwrap()));
    });

    let rust = Translator::new(Config {
        emit: EmitFormat::Rust,
        ..Config::default()
    })
    .unwrap();
    group.bench_function("rust", |b| {
        b.iter(|| black_box(rust.translate(&document, None).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_rewrite, bench_translate);

criterion_main!(benches);
