//! Benchmarks for both normalizer pipelines and a full store round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mathbridge_core::{
    normalize_for_display, normalize_for_parsing, ExpressionStore, JsonBridge, LatexGrammar,
    SymbolNameGenerator,
};

/// Editor markup with `terms` summands, each hitting every forward stage.
fn editor_markup(terms: usize) -> String {
    (0..terms)
        .map(|i| format!(r"E_{{rear{}}} \cdot r_{{sum, {}}} e^{{-\frac{{t}}{{\tau}}}}", i, i))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Printer-style output over generator aliases, as an export/import yields.
fn printed_markup(terms: usize) -> String {
    SymbolNameGenerator::new()
        .take(terms)
        .map(|alias| format!("0.5 {} beta_{{r}} x_nm", alias))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_for_parsing");

    for size in [1, 16, 128] {
        let markup = editor_markup(size);
        group.bench_with_input(BenchmarkId::new("terms", size), &markup, |b, m| {
            b.iter(|| black_box(normalize_for_parsing(m)))
        });
    }

    group.finish();
}

fn bench_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_for_display");

    for size in [1, 16, 128] {
        let markup = printed_markup(size);
        group.bench_with_input(BenchmarkId::new("terms", size), &markup, |b, m| {
            b.iter(|| black_box(normalize_for_display(m)))
        });
    }

    group.finish();
}

fn bench_store_round_trip(c: &mut Criterion) {
    let markup = editor_markup(8);

    c.bench_function("store_export_import", |b| {
        b.iter(|| {
            let mut store = ExpressionStore::new(LatexGrammar::new());
            store.set_from_markup(&markup).ok();
            if let Ok(value) = store.export_foreign(&JsonBridge) {
                store.import_foreign(&JsonBridge, &value).ok();
            }
            black_box(store.to_markup().len())
        })
    });
}

criterion_group!(benches, bench_forward, bench_reverse, bench_store_round_trip);
criterion_main!(benches);
