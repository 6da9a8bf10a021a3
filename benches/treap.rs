use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::collections::BTreeMap;
use treap_collections::arena::TypedArena;
use treap_collections::treap::TreapMultiset;

const NUM_OF_OPERATIONS: usize = 1000;
const CHUNK_SIZE: usize = 1024;

fn random_values() -> Vec<u32> {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    (0..NUM_OF_OPERATIONS).map(|_| rng.next_u32()).collect()
}

fn bench_btreemap_insert(c: &mut Criterion) {
    let values = random_values();
    c.bench_function("bench btreemap insert", move |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for value in &values {
                *map.entry(*value).or_insert(0) += 1;
            }
        })
    });
}

fn bench_treap_insert(c: &mut Criterion) {
    let values = random_values();
    c.bench_function("bench treap insert", move |b| {
        b.iter(|| {
            let mut set = TreapMultiset::with_allocator(TypedArena::new(CHUNK_SIZE));
            for value in &values {
                set.insert(*value).unwrap();
            }
        })
    });
}

fn bench_treap_insert_sorted(c: &mut Criterion) {
    c.bench_function("bench treap insert sorted", |b| {
        b.iter(|| {
            let mut set = TreapMultiset::with_allocator(TypedArena::new(CHUNK_SIZE));
            for value in 0..NUM_OF_OPERATIONS {
                set.insert(value).unwrap();
            }
        })
    });
}

fn bench_treap_find(c: &mut Criterion) {
    let values = random_values();
    let set = values.iter().cloned().collect::<TreapMultiset<u32>>();
    c.bench_function("bench treap find", move |b| {
        b.iter(|| {
            for value in &values {
                black_box(set.find(value));
            }
        })
    });
}

fn bench_treap_iter(c: &mut Criterion) {
    let set = random_values().into_iter().collect::<TreapMultiset<u32>>();
    c.bench_function("bench treap iter", move |b| {
        b.iter(|| {
            for value in &set {
                black_box(value);
            }
        })
    });
}

fn bench_treap_clone(c: &mut Criterion) {
    let set = random_values().into_iter().collect::<TreapMultiset<u32>>();
    c.bench_function("bench treap clone", move |b| b.iter(|| black_box(set.clone())));
}

criterion_group!(
    benches,
    bench_btreemap_insert,
    bench_treap_insert,
    bench_treap_insert_sorted,
    bench_treap_find,
    bench_treap_iter,
    bench_treap_clone,
);
criterion_main!(benches);
