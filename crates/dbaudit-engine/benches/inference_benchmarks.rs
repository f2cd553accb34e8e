//! Benchmarks for relation inference and full analysis
//!
//! These benchmarks measure how the relation inference and the rule
//! catalogue scale with large schemas.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dbaudit_core::{Attribute, Config, Database, Entity};
use dbaudit_engine::{analyze_database, infer_missing_relations, AnalyzeInput};
use std::collections::BTreeMap;

/// Generate a schema with N tables, each referencing the 2 previous ones
/// through `<table>_id` attributes, without declared relations
fn generate_large_schema(num_entities: usize) -> Database {
    let entities = (0..num_entities)
        .map(|i| {
            let mut attrs = vec![
                Attribute::new("id", "bigint"),
                Attribute::new("name", "varchar"),
                Attribute::new("created_at", "timestamptz"),
            ];
            for j in i.saturating_sub(2)..i {
                attrs.push(Attribute::new(format!("table_{}_id", j), "bigint"));
            }
            attrs.push(Attribute::new("created_by", "bigint"));
            Entity::new(format!("table_{}s", i), attrs).with_pk(vec![vec!["id".to_string()]])
        })
        .chain(std::iter::once(
            Entity::new("users", vec![Attribute::new("id", "bigint")]).with_pk(vec![vec!["id".to_string()]]),
        ))
        .collect();

    Database {
        entities,
        ..Default::default()
    }
}

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_missing_relations");

    for size in [10, 100, 1000] {
        let database = generate_large_schema(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &database, |b, db| {
            b.iter(|| infer_missing_relations(black_box(&db.entities), black_box(&db.relations)));
        });
    }

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_database");
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let config = Config::default();
    let reference = BTreeMap::new();

    for size in [10, 100, 1000] {
        let database = generate_large_schema(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &database, |b, db| {
            b.iter(|| {
                let input = AnalyzeInput {
                    now,
                    database: db,
                    queries: &[],
                    history: &[],
                    reference: &reference,
                };
                analyze_database(black_box(&config), input, &[])
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inference, bench_analyze);
criterion_main!(benches);
