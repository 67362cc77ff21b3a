//! Benchmarks for trie operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeSet;
use trie_index::{HybridTrie, PatriciaTrie};

fn generate_sequential_keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("key:{:08}", i).into_bytes()).collect()
}

fn generate_url_like_keys(n: usize) -> Vec<Vec<u8>> {
    let domains = ["example.com", "test.org", "demo.net", "sample.io"];
    let paths = ["users", "posts", "comments", "api/v1", "api/v2"];

    (0..n)
        .map(|i| {
            let domain = domains[i % domains.len()];
            let path = paths[(i / domains.len()) % paths.len()];
            let id = i / (domains.len() * paths.len());
            format!("{}/{}/{}", domain, path, id).into_bytes()
        })
        .collect()
}

fn build_patricia(keys: &[Vec<u8>]) -> PatriciaTrie {
    let mut trie = PatriciaTrie::new();
    for key in keys {
        trie.insert(key).unwrap();
    }
    trie
}

fn build_hybrid(keys: &[Vec<u8>], balanced: bool) -> HybridTrie {
    let mut trie = HybridTrie::new();
    for (i, key) in keys.iter().enumerate() {
        let marker = i as u64 + 1;
        if balanced {
            trie.insert_balanced(key, marker).unwrap();
        } else {
            trie.insert(key, marker).unwrap();
        }
    }
    trie
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_sequential_keys(size);

        group.bench_with_input(BenchmarkId::new("Patricia", size), &keys, |b, keys| {
            b.iter(|| black_box(build_patricia(keys)));
        });

        group.bench_with_input(BenchmarkId::new("Hybrid", size), &keys, |b, keys| {
            b.iter(|| black_box(build_hybrid(keys, false)));
        });

        group.bench_with_input(BenchmarkId::new("HybridBalanced", size), &keys, |b, keys| {
            b.iter(|| black_box(build_hybrid(keys, true)));
        });

        group.bench_with_input(BenchmarkId::new("BTreeSet", size), &keys, |b, keys| {
            b.iter(|| {
                let set: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();
                black_box(set)
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_sequential_keys(size);
        let patricia = build_patricia(&keys);
        let hybrid = build_hybrid(&keys, true);

        group.bench_with_input(BenchmarkId::new("Patricia", size), &keys, |b, keys| {
            b.iter(|| keys.iter().filter(|key| patricia.contains(key)).count());
        });

        group.bench_with_input(BenchmarkId::new("HybridBalanced", size), &keys, |b, keys| {
            b.iter(|| keys.iter().filter(|key| hybrid.contains(key)).count());
        });
    }

    group.finish();
}

fn bench_url_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_patterns");

    let keys = generate_url_like_keys(10_000);
    let patricia = build_patricia(&keys);
    let hybrid = build_hybrid(&keys, false);

    group.bench_function("Patricia/prefix_count", |b| {
        b.iter(|| black_box(patricia.prefix_count(b"example.com/api")));
    });

    group.bench_function("Hybrid/prefix_count", |b| {
        b.iter(|| black_box(hybrid.prefix_count(b"example.com/api")));
    });

    group.bench_function("Patricia/merge", |b| {
        let (left, right) = keys.split_at(keys.len() / 2);
        let left = build_patricia(left);
        let right = build_patricia(right);
        b.iter(|| black_box(left.merged(&right)));
    });

    group.bench_function("Patricia/to_json", |b| {
        b.iter(|| black_box(patricia.to_json_string(false).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_url_patterns);
criterion_main!(benches);
