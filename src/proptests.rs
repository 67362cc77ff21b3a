use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_patricia(t: &PatriciaTrie) {
    let issues = t.verify();
    assert!(issues.is_empty(), "patricia invariants violated: {issues:?}");
}

fn validate_hybrid(t: &HybridTrie) {
    let issues = t.verify();
    assert!(issues.is_empty(), "hybrid invariants violated: {issues:?}");
}

/// Model prefix count: keys of `m` starting with `prefix`.
fn model_prefix_count(m: &BTreeSet<Vec<u8>>, prefix: &[u8]) -> usize {
    m.iter().filter(|k| k.starts_with(prefix)).count()
}

fn model_keys(m: &BTreeSet<Vec<u8>>) -> Vec<String> {
    m.iter().map(|k| key::to_string(k)).collect()
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A four-symbol alphabet keeps shared prefixes, splits and splices frequent.
    prop::collection::vec(b'a'..=b'd', 1..=6)
}

fn prefix_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'd', 0..=4)
}

fn key_set_strategy() -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(key_strategy(), 0..=64)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Contains(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    PrefixCount(#[proptest(strategy = "prefix_strategy()")] Vec<u8>),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_patricia(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut t = PatriciaTrie::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let added = t.insert(&key).unwrap();
                    prop_assert_eq!(added, m.insert(key));
                }
                Op::Remove(key) => {
                    let removed = t.remove(&key).unwrap();
                    prop_assert_eq!(removed, m.remove(&key));
                }
                Op::Contains(key) => {
                    prop_assert_eq!(t.contains(&key), m.contains(&key));
                }
                Op::PrefixCount(prefix) => {
                    prop_assert_eq!(t.prefix_count(&prefix), model_prefix_count(&m, &prefix));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_patricia(&t);
        prop_assert_eq!(t.keys(), model_keys(&m));
        prop_assert_eq!(t.is_empty(), m.is_empty());
    }

    #[test]
    fn prop_equivalence_hybrid(
        ops in prop::collection::vec(any::<Op>(), 0..=400),
        balanced in any::<bool>(),
    ) {
        let mut t = HybridTrie::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

        for (seq, op) in (1u64..).zip(ops) {
            match op {
                Op::Insert(key) => {
                    let added = if balanced {
                        t.insert_balanced(&key, seq).unwrap()
                    } else {
                        t.insert(&key, seq).unwrap()
                    };
                    prop_assert_eq!(added, m.insert(key));
                }
                Op::Remove(key) => {
                    let removed = t.remove(&key).unwrap();
                    prop_assert_eq!(removed, m.remove(&key));
                }
                Op::Contains(key) => {
                    prop_assert_eq!(t.contains(&key), m.contains(&key));
                }
                Op::PrefixCount(prefix) => {
                    prop_assert_eq!(t.prefix_count(&prefix), model_prefix_count(&m, &prefix));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_hybrid(&t);
        prop_assert_eq!(t.keys(), model_keys(&m));
        prop_assert_eq!(t.is_empty(), m.is_empty());
    }

    #[test]
    fn prop_json_round_trip(keys in key_set_strategy(), balanced in any::<bool>()) {
        let config = Config { rebalance: balanced, pretty_json: false };

        let p: PatriciaTrie = build_from_words(&keys, &config).unwrap();
        let back: PatriciaTrie = load(render(&p, &config).unwrap().as_bytes(), &config).unwrap();
        prop_assert_eq!(back.to_json(), p.to_json());
        prop_assert_eq!(back.keys(), model_keys(&keys));
        prop_assert_eq!(back.node_count(), p.node_count());
        validate_patricia(&back);

        let h: HybridTrie = build_from_words(&keys, &config).unwrap();
        let back: HybridTrie = load(render(&h, &config).unwrap().as_bytes(), &config).unwrap();
        prop_assert_eq!(back.to_json(), h.to_json());
        prop_assert_eq!(back.keys(), model_keys(&keys));
        prop_assert_eq!(back.height(), h.height());
        validate_hybrid(&back);
    }

    #[test]
    fn prop_merge_is_union(a in key_set_strategy(), b in key_set_strategy()) {
        let config = Config::default();
        let union: BTreeSet<Vec<u8>> = a.union(&b).cloned().collect();

        let pa: PatriciaTrie = build_from_words(&a, &config).unwrap();
        let pb: PatriciaTrie = build_from_words(&b, &config).unwrap();
        let copied = pa.merged(&pb);
        prop_assert_eq!(pa.keys(), model_keys(&a));
        prop_assert_eq!(pb.keys(), model_keys(&b));
        let merged = pa.merge(pb);
        prop_assert_eq!(merged.keys(), model_keys(&union));
        prop_assert_eq!(merged.len(), union.len());
        prop_assert_eq!(copied.to_json(), merged.to_json());
        validate_patricia(&merged);

        let mut ha: HybridTrie = build_from_words(&a, &config).unwrap();
        let hb: HybridTrie = build_from_words(&b, &config).unwrap();
        let copied = ha.merged(&hb);
        ha.merge(hb);
        prop_assert_eq!(ha.keys(), model_keys(&union));
        prop_assert_eq!(ha.len(), union.len());
        prop_assert_eq!(copied.keys(), model_keys(&union));
        validate_hybrid(&ha);
    }

    #[test]
    fn prop_merge_rebalancing_is_union(a in key_set_strategy(), b in key_set_strategy()) {
        let config = Config {
            rebalance: true,
            ..Config::default()
        };
        let union: BTreeSet<Vec<u8>> = a.union(&b).cloned().collect();

        let mut ha = HybridTrie::with_config(&config);
        for (i, k) in a.iter().enumerate() {
            ha.insert(k, i as u64 + 1).unwrap();
        }
        let mut hb = HybridTrie::new();
        for (i, k) in b.iter().enumerate() {
            hb.insert(k, i as u64 + 1).unwrap();
        }
        let copied = ha.merged(&hb);
        ha.merge(hb);
        prop_assert_eq!(ha.keys(), model_keys(&union));
        prop_assert_eq!(ha.len(), union.len());
        prop_assert_eq!(copied.to_json(), ha.to_json());
        validate_hybrid(&ha);
        validate_hybrid(&copied);
    }

    #[test]
    fn prop_prefix_count_consistency(keys in key_set_strategy(), prefix in prefix_strategy()) {
        let config = Config::default();
        let p: PatriciaTrie = build_from_words(&keys, &config).unwrap();
        let h: HybridTrie = build_from_words(&keys, &config).unwrap();

        // count(prefix) = [prefix is stored] + sum of count(prefix + c)
        let ends_here = usize::from(!prefix.is_empty() && keys.contains(&prefix));
        let mut extended = prefix.clone();
        let mut p_sum = ends_here;
        let mut h_sum = ends_here;
        for c in b'a'..=b'd' {
            extended.push(c);
            p_sum += p.prefix_count(&extended);
            h_sum += h.prefix_count(&extended);
            extended.pop();
        }
        prop_assert_eq!(p.prefix_count(&prefix), p_sum);
        prop_assert_eq!(h.prefix_count(&prefix), h_sum);
        prop_assert_eq!(p_sum, model_prefix_count(&keys, &prefix));
    }

    #[test]
    fn prop_insert_remove_inverse(keys in key_set_strategy(), extra in key_strategy()) {
        prop_assume!(!keys.contains(&extra));
        let config = Config::default();

        let mut p: PatriciaTrie = build_from_words(&keys, &config).unwrap();
        let before = p.to_json();
        prop_assert!(p.insert(&extra).unwrap());
        prop_assert!(p.remove(&extra).unwrap());
        prop_assert_eq!(p.to_json(), before);

        let mut h: HybridTrie = build_from_words(&keys, &config).unwrap();
        prop_assert!(h.insert(&extra, 1).unwrap());
        prop_assert!(h.remove(&extra).unwrap());
        prop_assert_eq!(h.keys(), model_keys(&keys));
        validate_hybrid(&h);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_set() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"c".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"ba".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let expected: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();
    let reference = build_from_words::<PatriciaTrie, _>(&keys, &Config::default())
        .unwrap()
        .to_json();

    for_each_permutation(&keys, |perm| {
        let mut p = PatriciaTrie::new();
        let mut h = HybridTrie::new();
        let mut hb = HybridTrie::new();
        for (seq, k) in (1u64..).zip(&perm) {
            assert!(p.insert(k).unwrap());
            assert!(h.insert(k, seq).unwrap());
            assert!(hb.insert_balanced(k, seq).unwrap());
        }

        validate_patricia(&p);
        validate_hybrid(&h);
        validate_hybrid(&hb);
        // The Patricia shape does not depend on insertion order.
        assert_eq!(p.to_json(), reference);
        assert_eq!(p.keys(), model_keys(&expected));
        assert_eq!(h.keys(), model_keys(&expected));
        assert_eq!(hb.keys(), model_keys(&expected));
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();
    let config = Config::default();
    let base_p: PatriciaTrie = build_from_words(&keys, &config).unwrap();
    let base_h: HybridTrie = build_from_words(&keys, &config).unwrap();
    let base_m: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();

    for_each_permutation(&keys, |perm| {
        let mut p = base_p.clone();
        let mut h = base_h.clone();
        let mut m = base_m.clone();

        for k in perm {
            let expected = m.remove(&k);
            assert_eq!(p.remove(&k).unwrap(), expected);
            assert_eq!(h.remove(&k).unwrap(), expected);
            assert_eq!(p.len(), m.len());
            assert_eq!(h.len(), m.len());
            validate_patricia(&p);
            validate_hybrid(&h);
            assert_eq!(p.keys(), model_keys(&m));
        }
        assert!(p.is_empty());
        assert!(h.is_empty());
        assert_eq!(p.node_count(), 1);
        assert_eq!(h.node_count(), 0);
    });
}

#[test]
fn random_workload_matches_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x7269_6521);
    let mut p = PatriciaTrie::new();
    let mut h = HybridTrie::with_config(&Config {
        rebalance: true,
        ..Config::default()
    });
    let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

    for seq in 1..=20_000u64 {
        let len = rng.gen_range(1..=12);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'h')).collect();
        if rng.gen_bool(0.7) {
            let added = m.insert(key.clone());
            assert_eq!(p.insert(&key).unwrap(), added);
            assert_eq!(WordTrie::add_word(&mut h, &key, seq).unwrap(), added);
        } else {
            let removed = m.remove(&key);
            assert_eq!(p.remove(&key).unwrap(), removed);
            assert_eq!(h.remove(&key).unwrap(), removed);
        }
    }

    validate_patricia(&p);
    validate_hybrid(&h);
    assert_eq!(p.keys(), model_keys(&m));
    assert_eq!(h.keys(), model_keys(&m));
    for prefix in [&b"a"[..], b"ab", b"hh", b"abc"] {
        let expected = model_prefix_count(&m, prefix);
        assert_eq!(p.prefix_count(prefix), expected);
        assert_eq!(h.prefix_count(prefix), expected);
    }
}
