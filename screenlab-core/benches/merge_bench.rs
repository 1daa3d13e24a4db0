//! Criterion benchmarks for ScreenLab hot paths.
//!
//! Benchmarks:
//! 1. Three-source merge (extract, normalize, reconcile)
//! 2. Emission of a merged map to pretty JSON
//! 3. Wilder RSI over a long series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use screenlab_core::data::{AliasTable, Extractor};
use screenlab_core::emit::{Emitter, OutputShape};
use screenlab_core::indicators::{Indicator, Rsi};
use screenlab_core::reconcile::{Precedence, Reconciler, SourceInput};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_payloads(n: usize) -> (Value, Value, Value) {
    let primary: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "ticker": format!("T{i:05}"),
                "price": 100.0 + i as f64,
                "change": format!("{:.2}%", (i as f64 * 0.1).sin()),
                "volume": "1.25M",
                "rsi": if i % 3 == 0 { Value::Null } else { json!(45.0) },
                "sector.tr": "Technology",
            })
        })
        .collect();
    let sentiment: Vec<Value> = (0..n)
        .step_by(2)
        .map(|i| json!({"symbol": format!("T{i:05}"), "mentions": i, "sentiment": 0.5}))
        .collect();
    let regional: serde_json::Map<String, Value> = (0..n)
        .step_by(3)
        .map(|i| {
            (
                format!("T{i:05}"),
                json!({"price": 1.0, "rsi": 30.0, "country": "US", "oversold": true}),
            )
        })
        .collect();
    (
        json!({ "data": primary }),
        json!(sentiment),
        Value::Object(regional),
    )
}

fn make_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn merge(p: &Value, s: &Value, r: &Value) -> screenlab_core::reconcile::Merged {
    let keys = ["data", "stocks", "results"];
    let inputs = vec![
        SourceInput::new("primary", AliasTable::primary(), Extractor::new(&keys).extract(p.clone())),
        SourceInput::new("sentiment", AliasTable::sentiment(), Extractor::new(&keys).extract(s.clone())),
        SourceInput::new("regional", AliasTable::regional(), Extractor::new(&keys).extract(r.clone())),
    ];
    Reconciler::new(Precedence::standard())
        .merge(inputs)
        .unwrap_or_else(|e| panic!("merge failed: {e}"))
}

// ── 1. Merge ─────────────────────────────────────────────────────────

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for n in [100, 1_000, 5_000] {
        let (p, s, r) = make_payloads(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(merge(&p, &s, &r)))
        });
    }
    group.finish();
}

// ── 2. Emit ──────────────────────────────────────────────────────────

fn bench_emit(c: &mut Criterion) {
    let (p, s, r) = make_payloads(1_000);
    let merged = merge(&p, &s, &r);
    let emitter = Emitter::new(OutputShape::Mapping);
    c.bench_function("emit_1000", |b| {
        b.iter(|| black_box(emitter.to_pretty_string(&merged.records)))
    });
}

// ── 3. RSI ───────────────────────────────────────────────────────────

fn bench_rsi(c: &mut Criterion) {
    let closes = make_closes(5_000);
    let rsi = Rsi::new(14);
    c.bench_function("rsi_14_5000", |b| b.iter(|| black_box(rsi.compute(&closes))));
}

criterion_group!(benches, bench_merge, bench_emit, bench_rsi);
criterion_main!(benches);
