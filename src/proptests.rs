//! Model-based tests: random action sequences run against a naive
//! reference container, with structural invariants checked at every step.

use proptest::prelude::*;

use crate::compare::IndexLess;
use crate::metric::SquareEuclidean;
use crate::rank::StaticRank;
use crate::tree::{KdTree, LooseBalancing, RelaxedKdTree};

type Key = [i8; 2];
type Model = Vec<(Key, u32)>;

#[derive(Debug, Clone)]
enum Action {
    Insert(Key),
    Erase(Key),
    Find(Key),
    Range(Key, Key),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = Key> {
    (0i8..8, 0i8..8).prop_map(|(x, y)| [x, y])
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        5 => key_strategy().prop_map(Action::Insert),
        2 => key_strategy().prop_map(Action::Erase),
        2 => key_strategy().prop_map(Action::Find),
        2 => (key_strategy(), key_strategy()).prop_map(|(a, b)| Action::Range(a, b)),
        1 => Just(Action::Clear),
    ]
}

fn model_range(model: &Model, lo: Key, hi: Key) -> Vec<Key> {
    let mut keys: Vec<Key> = model
        .iter()
        .filter(|(k, _)| (0..2).all(|ax| lo[ax] <= k[ax] && k[ax] <= hi[ax]))
        .map(|(k, _)| *k)
        .collect();
    keys.sort();
    keys
}

fn check_final_state<F>(model: &Model, tree_keys: Vec<Key>, mapping0: Vec<Key>, nearest: F)
where
    F: Fn() -> Option<i32>,
{
    let mut expect: Vec<Key> = model.iter().map(|(k, _)| *k).collect();
    expect.sort();
    let mut got = tree_keys;
    got.sort();
    assert_eq!(got, expect, "tree and model must hold the same multiset");

    for pair in mapping0.windows(2) {
        assert!(pair[0][0] <= pair[1][0], "mapping must be sorted on its axis");
    }
    assert_eq!(mapping0.len(), model.len());

    let brute = model
        .iter()
        .map(|(k, _)| (k[0] as i32 - 3).pow(2) + (k[1] as i32 - 3).pow(2))
        .min();
    assert_eq!(nearest(), brute, "nearest distance must match brute force");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn relaxed_tree_matches_model(actions in proptest::collection::vec(action_strategy(), 1..100)) {
        let mut tree: RelaxedKdTree<Key, u32, StaticRank<2>, IndexLess, LooseBalancing> =
            RelaxedKdTree::default();
        let mut model: Model = Vec::new();
        let mut counter = 0u32;
        for action in actions {
            match action {
                Action::Insert(k) => {
                    tree.insert(k, counter);
                    model.push((k, counter));
                    counter += 1;
                }
                Action::Erase(k) => {
                    let removed = tree.erase(&k);
                    let before = model.len();
                    model.retain(|(mk, _)| *mk != k);
                    prop_assert_eq!(removed, before - model.len());
                }
                Action::Find(k) => {
                    let expect = model.iter().any(|(mk, _)| *mk == k);
                    prop_assert_eq!(tree.contains(&k), expect);
                }
                Action::Range(a, b) => {
                    let lo = [a[0].min(b[0]), a[1].min(b[1])];
                    let hi = [a[0].max(b[0]), a[1].max(b[1])];
                    let mut got: Vec<Key> = tree.range(lo, hi).map(|(k, _)| *k).collect();
                    got.sort();
                    prop_assert_eq!(got, model_range(&model, lo, hi));
                }
                Action::Clear => {
                    tree.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(tree.len(), model.len());
            tree.core.check_invariants(true);
        }
        let origin = [3, 3];
        check_final_state(
            &model,
            tree.iter().map(|(k, _)| *k).collect(),
            tree.mapping(0).map(|(k, _)| *k).collect(),
            || tree.nearest(&origin, SquareEuclidean).map(|(d, _, _)| d as i32),
        );
    }

    #[test]
    fn strict_tree_matches_model(actions in proptest::collection::vec(action_strategy(), 1..100)) {
        let mut tree: KdTree<Key, u32, StaticRank<2>, IndexLess> = KdTree::default();
        let mut model: Model = Vec::new();
        let mut counter = 0u32;
        for action in actions {
            match action {
                Action::Insert(k) => {
                    tree.insert(k, counter);
                    model.push((k, counter));
                    counter += 1;
                }
                Action::Erase(k) => {
                    let removed = tree.erase(&k);
                    let before = model.len();
                    model.retain(|(mk, _)| *mk != k);
                    prop_assert_eq!(removed, before - model.len());
                }
                Action::Find(k) => {
                    let expect = model.iter().any(|(mk, _)| *mk == k);
                    prop_assert_eq!(tree.contains(&k), expect);
                }
                Action::Range(a, b) => {
                    let lo = [a[0].min(b[0]), a[1].min(b[1])];
                    let hi = [a[0].max(b[0]), a[1].max(b[1])];
                    let mut got: Vec<Key> = tree.range(lo, hi).map(|(k, _)| *k).collect();
                    got.sort();
                    prop_assert_eq!(got, model_range(&model, lo, hi));
                }
                Action::Clear => {
                    tree.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(tree.len(), model.len());
            tree.core.check_invariants(true);
        }
        let origin = [3, 3];
        check_final_state(
            &model,
            tree.iter().map(|(k, _)| *k).collect(),
            tree.mapping(0).map(|(k, _)| *k).collect(),
            || tree.nearest(&origin, SquareEuclidean).map(|(d, _, _)| d as i32),
        );
    }

    #[test]
    fn equal_range_agrees_with_model(
        keys in proptest::collection::vec(key_strategy(), 0..60),
        model_key in key_strategy(),
    ) {
        let mut tree: RelaxedKdTree<Key, u32, StaticRank<2>> = RelaxedKdTree::default();
        for (i, k) in keys.iter().enumerate() {
            tree.insert(*k, i as u32);
        }
        let expect = keys.iter().filter(|k| **k == model_key).count();
        prop_assert_eq!(tree.equal_range(&model_key).count(), expect);
    }
}
