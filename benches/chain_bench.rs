use criterion::{black_box, criterion_group, criterion_main, Criterion};
use failover_probe::dns::{ChainResolver, Name, StaticCnameTable};
use std::sync::Arc;

const PATTERN: &str = ".gateway.example.cloud";

/// Benchmark chain traversal overhead against an in-memory table.
/// No network I/O; measures hop bookkeeping and name normalization only.
fn benchmark_chain_traversal(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    let table = StaticCnameTable::new()
        .alias("h0.example.com", "h1.example.com.")
        .alias("h1.example.com", "h2.example.com.")
        .alias("h2.example.com", "h3.example.com.")
        .alias("h3.example.com", "h4.example.com.")
        .alias("h4.example.com", "1.gateway.example.cloud.");
    let resolver = ChainResolver::new(Arc::new(table));

    let terminal = Name::new("1.gateway.example.cloud");
    c.bench_function("resolve_terminal_short_circuit", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(resolver.resolve(&terminal, PATTERN, 5).await) })
    });

    let start = Name::new("h4.example.com");
    c.bench_function("resolve_single_hop", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(resolver.resolve(&start, PATTERN, 5).await) })
    });

    let start = Name::new("h0.example.com");
    c.bench_function("resolve_five_hops", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(resolver.resolve(&start, PATTERN, 5).await) })
    });
}

criterion_group!(benches, benchmark_chain_traversal);
criterion_main!(benches);
