use chain_table::{AsciiCaseless, DynTable, PoolConfig, Table};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
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

fn bench_put_fresh_100k(c: &mut Criterion) {
    c.bench_function("table::put_fresh_100k", |b| {
        b.iter_batched(
            Table::<String, u64>::new,
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.put(key(x), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_put_presized_100k(c: &mut Criterion) {
    c.bench_function("table::put_presized_100k", |b| {
        b.iter_batched(
            || Table::<String, u64>::with_expected_len(100_000).unwrap(),
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.put(key(x), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// Insert after a clear, so every node comes out of the pool.
fn bench_put_pooled_vs_unpooled(c: &mut Criterion) {
    for (name, pool) in [
        ("table::put_warm_pooled_50k", PoolConfig::new(1024, 65536)),
        ("table::put_warm_unpooled_50k", PoolConfig::disabled()),
    ] {
        c.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut t: Table<u64, u64> =
                        Table::builder().pool_config(pool).build().unwrap();
                    for (i, x) in lcg(2).take(50_000).enumerate() {
                        t.put(x, i as u64);
                    }
                    t.clear(false);
                    t
                },
                |mut t| {
                    for (i, x) in lcg(3).take(50_000).enumerate() {
                        t.put(x, i as u64);
                    }
                    black_box(t)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_fetch_hit_10k(c: &mut Criterion) {
    c.bench_function("table::fetch_hit_10k_on_100k", |b| {
        let mut t = Table::new();
        let keys: Vec<_> = lcg(7).take(100_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            t.put(k.clone(), i as u64);
        }
        // Precompute 10k random query keys using LCG
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(t.fetch(k.as_str()));
            }
        })
    });
}

fn bench_fetch_miss_10k(c: &mut Criterion) {
    c.bench_function("table::fetch_miss_10k_on_100k", |b| {
        let mut t = Table::new();
        for (i, x) in lcg(11).take(100_000).enumerate() {
            t.put(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(t.fetch(k.as_str()));
            }
        })
    });
}

fn bench_fetch_caseless_10k(c: &mut Criterion) {
    c.bench_function("table::fetch_caseless_10k_on_100k", |b| {
        let mut t = Table::with_strategy(100_000, AsciiCaseless).unwrap();
        let keys: Vec<_> = lcg(13).take(100_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            t.put(k.clone(), i as u64);
        }
        let queries: Vec<String> = keys
            .iter()
            .step_by(10)
            .map(|k| k.to_ascii_uppercase())
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(t.fetch(k.as_str()));
            }
        })
    });
}

fn bench_dyn_int_10k(c: &mut Criterion) {
    c.bench_function("table::dyn_put_fetch_int_10k", |b| {
        b.iter_batched(
            DynTable::<u64>::i64,
            |mut t| {
                for x in lcg(17).take(10_000) {
                    t.put_int(x as i64, x).unwrap();
                }
                for x in lcg(17).take(10_000) {
                    black_box(t.fetch_int(x as i64).unwrap());
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("table::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut t = Table::new();
                let keys: Vec<String> = lcg(5).take(110_000).map(key).collect();
                for (i, k) in keys.iter().enumerate() {
                    t.put(k.clone(), i as u64);
                }
                // Precompute 10k unique indices via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (t, to_remove)
            },
            |(mut t, to_remove)| {
                for k in &to_remove {
                    black_box(t.remove(k.as_str()));
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_put;
    config = bench_config();
    targets = bench_put_fresh_100k, bench_put_presized_100k, bench_put_pooled_vs_unpooled
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_fetch_hit_10k,
              bench_fetch_miss_10k,
              bench_fetch_caseless_10k,
              bench_dyn_int_10k,
              bench_remove_random_10k
}
criterion_main!(benches_put, benches_ops);
