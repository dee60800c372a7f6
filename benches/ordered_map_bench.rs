use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use orderedmap::OrderedMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (OrderedMap<String, u64>, Vec<String>) {
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    let m = keys.iter().cloned().zip(0u64..).collect();
    (m, keys)
}

fn bench_store(c: &mut Criterion) {
    c.bench_function("ordered_map_store_10k", |b| {
        let keys: Vec<_> = lcg(1).take(10_000).map(key).collect();
        b.iter_batched(
            || (OrderedMap::<String, u64>::new(), keys.clone()),
            |(mut m, keys)| {
                for (i, k) in keys.into_iter().enumerate() {
                    m.store(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_load_hit(c: &mut Criterion) {
    c.bench_function("ordered_map_load_hit", |b| {
        let (m, keys) = filled(7, 20_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.load(k.as_str()));
        })
    });
}

fn bench_load_miss(c: &mut Criterion) {
    c.bench_function("ordered_map_load_miss", |b| {
        let (m, _) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // keys unlikely to be in the map
            let k = key(miss.next().unwrap());
            black_box(m.load(&k));
        })
    });
}

fn bench_tombstone_revive(c: &mut Criterion) {
    c.bench_function("ordered_map_logical_delete_revive", |b| {
        let (mut m, keys) = filled(13, 10_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            m.logical_delete(k.as_str());
            m.store(k.clone(), 0);
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("ordered_map_iter_10k", |b| {
        let (m, _) = filled(17, 10_000);
        b.iter(|| black_box(m.values().sum::<u64>()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_store, bench_load_hit, bench_load_miss, bench_tombstone_revive, bench_iterate
}
criterion_main!(benches);
