use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use interchangedb_index::BPlusTree;

criterion_group!(benches, bench_insert, bench_search, bench_range, bench_remove);
criterion_main!(benches);

fn filled(order: usize, n: u64) -> BPlusTree<u64, u64> {
    let mut tree = BPlusTree::new(order).unwrap();
    for i in 0..n {
        tree.insert(i, i).unwrap();
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert");
    for order in [4, 32, 128].iter() {
        let order = *order;
        group.bench_function(BenchmarkId::new("Tree", order), |b| {
            b.iter(|| filled(order, 10_000))
        });
    }
    group.bench_function(BenchmarkId::new("Std", 0), |b| {
        b.iter(|| {
            let mut map = std::collections::BTreeMap::new();
            for i in 0..10_000u64 {
                map.insert(i, i);
            }
            map
        })
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search");
    for n in [1000, 100_000].iter() {
        let n = *n;
        let tree = filled(32, n);
        let page_tree = {
            let mut tree = BPlusTree::for_page();
            for i in 0..n {
                tree.insert(i, i).unwrap();
            }
            tree
        };

        group.bench_function(BenchmarkId::new("Order32", n), |b| {
            b.iter(|| {
                for i in (0..n).step_by(7) {
                    assert!(tree.get(&i) == Some(&i));
                }
            })
        });
        group.bench_function(BenchmarkId::new("Page", n), |b| {
            b.iter(|| {
                for i in (0..n).step_by(7) {
                    assert!(page_tree.get(&i) == Some(&i));
                }
            })
        });
    }
    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("Range");
    let tree = filled(32, 100_000);
    for width in [10u64, 1000, 50_000].iter() {
        let width = *width;
        group.bench_function(BenchmarkId::new("Forward", width), |b| {
            b.iter(|| tree.range(&25_000, &(25_000 + width)).count())
        });
        group.bench_function(BenchmarkId::new("Reverse", width), |b| {
            b.iter(|| tree.range(&25_000, &(25_000 + width)).rev().count())
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("Remove");
    for order in [4, 32].iter() {
        let order = *order;
        group.bench_function(BenchmarkId::new("Drain", order), |b| {
            b.iter_batched(
                || filled(order, 10_000),
                |mut tree| {
                    for i in 0..10_000u64 {
                        tree.remove(&i).unwrap();
                    }
                    tree
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}
