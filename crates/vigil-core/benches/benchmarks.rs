use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use vigil_core::fix::{FixAllOptions, default_fixers, fix_all};
use vigil_core::model::{Model, ModelProvider};
use vigil_core::{AnalysisEngine, TypeScriptProvider};

fn generate_typescript(types: usize) -> String {
    let mut code = String::with_capacity(types * 400);
    code.push_str("// Generated TypeScript declarations for benchmarking\n\n");

    for i in 0..types {
        code.push_str(&format!(
            r#"export interface Entity{i} {{
    id: number;
    name: string;
    describe(): string;
}}

export abstract class Repository{i}<Item, TKey, TValue> implements Entity{i} {{
    static instances: number = 0;
    id: number = {i};
    name: string = "repo_{i}";
    constructor(readonly item: Item) {{}}
    describe(): string {{ return this.name; }}
    find_by_key(key: TKey): TValue | undefined {{ return undefined; }}
}}

"#
        ));
    }

    code
}

fn bench_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("model");
    let provider = TypeScriptProvider::new();

    for types in [10, 50, 100] {
        let code = generate_typescript(types);
        group.throughput(Throughput::Elements(code.lines().count() as u64));
        group.bench_with_input(BenchmarkId::new("build", types), &code, |b, code| {
            b.iter(|| provider.build(black_box(code)))
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let provider = TypeScriptProvider::new();
    let engine = AnalysisEngine::default();

    for types in [10, 50, 100] {
        let Ok(model) = provider.build(&generate_typescript(types)) else {
            continue;
        };
        group.throughput(Throughput::Elements(model.len() as u64));
        group.bench_with_input(BenchmarkId::new("run_pass", types), &model, |b, model| {
            b.iter(|| engine.run_pass(black_box(model)))
        });
    }

    let models: Vec<Model> = (0..100)
        .filter_map(|i| provider.build(&generate_typescript(1 + i % 5)).ok())
        .collect();
    group.bench_function("run_many_100_units", |b| {
        b.iter(|| engine.run_many(black_box(&models)))
    });
    group.bench_function("sequential_100_units", |b| {
        b.iter(|| {
            for model in &models {
                let _ = engine.run_pass(black_box(model));
            }
        })
    });

    group.finish();
}

fn bench_fix(c: &mut Criterion) {
    let mut group = c.benchmark_group("fix");
    let provider = TypeScriptProvider::new();
    let engine = AnalysisEngine::default();
    let fixers = default_fixers();
    let code = generate_typescript(25);

    group.bench_function("fix_all_25_types", |b| {
        b.iter(|| {
            fix_all(
                &provider,
                &engine,
                &fixers,
                black_box(&code),
                FixAllOptions::default(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_model, bench_analysis, bench_fix);
criterion_main!(benches);
