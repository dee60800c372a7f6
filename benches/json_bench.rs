use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orderedmap::OrderedMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn sample(n: usize) -> OrderedMap<String, Vec<u64>> {
    lcg(3)
        .take(n)
        .map(|x| (format!("k{:016x}", x), vec![x, x >> 7, x >> 13]))
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("json_encode_1k", |b| {
        let m = sample(1_000);
        b.iter(|| black_box(m.to_json().unwrap()))
    });
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("json_decode_1k", |b| {
        let bytes = sample(1_000).to_json().unwrap();
        b.iter(|| {
            let m: OrderedMap<String, Vec<u64>> = OrderedMap::from_json(&bytes).unwrap();
            black_box(m)
        })
    });
}

fn bench_decode_serde(c: &mut Criterion) {
    c.bench_function("json_decode_1k_serde", |b| {
        let bytes = sample(1_000).to_json().unwrap();
        b.iter(|| {
            let m: OrderedMap<String, Vec<u64>> = serde_json::from_slice(&bytes).unwrap();
            black_box(m)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_encode, bench_decode, bench_decode_serde
}
criterion_main!(benches);
