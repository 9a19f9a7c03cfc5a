use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use set_store::SetStore;

fn populated(sizes: &[(&str, usize)]) -> SetStore {
    let store = SetStore::new();
    for (key, size) in sizes {
        store
            .sadd(*key, (0..*size).map(|i| format!("member:{}", i)))
            .unwrap();
    }
    store
}

fn bench_sadd(c: &mut Criterion) {
    let store = SetStore::new();
    let mut i = 0u64;
    c.bench_function("sadd_single", |b| {
        b.iter(|| {
            i += 1;
            store.sadd("bench", [i.to_string()]).unwrap()
        })
    });
}

fn bench_sinter(c: &mut Criterion) {
    let mut group = c.benchmark_group("sinter_small_vs_large");
    for large in [1_000usize, 10_000, 100_000] {
        let store = populated(&[("small", 16), ("large", large)]);
        group.bench_with_input(BenchmarkId::from_parameter(large), &large, |b, _| {
            b.iter(|| store.sinter(black_box(&["large", "small"][..])).unwrap())
        });
    }
    group.finish();
}

fn bench_srandmember(c: &mut Criterion) {
    let store = populated(&[("big", 100_000)]);
    c.bench_function("srandmember_default", |b| {
        b.iter(|| store.srandmember(black_box("big")).unwrap())
    });
    c.bench_function("srandmember_count_10", |b| {
        b.iter(|| store.srandmember_count(black_box("big"), 10).unwrap())
    });
}

fn bench_smove(c: &mut Criterion) {
    let store = populated(&[("a", 1)]);
    c.bench_function("smove_round_trip", |b| {
        b.iter(|| {
            store.smove("a", "b", "member:0").unwrap();
            store.smove("b", "a", "member:0").unwrap()
        })
    });
}

criterion_group!(benches, bench_sadd, bench_sinter, bench_srandmember, bench_smove);
criterion_main!(benches);
