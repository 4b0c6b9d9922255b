use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::compare::IndexLess;
use crate::metric::{Euclidean, Manhattan, SquareEuclidean};
use crate::rank::StaticRank;
use crate::tree::{KdTree, LooseBalancing, RelaxedKdTree};

type Strict2 = KdTree<[i32; 2], i32, StaticRank<2>, IndexLess>;
type Relaxed2 = RelaxedKdTree<[i32; 2], i32, StaticRank<2>, IndexLess, LooseBalancing>;

fn sample() -> Vec<[i32; 2]> {
    vec![[2, 3], [5, 4], [9, 6], [4, 7], [8, 1], [7, 2]]
}

fn strict_sample() -> Strict2 {
    let mut tree = Strict2::default();
    for (i, key) in sample().into_iter().enumerate() {
        tree.insert(key, i as i32);
    }
    tree
}

fn relaxed_sample() -> Relaxed2 {
    let mut tree = Relaxed2::default();
    for (i, key) in sample().into_iter().enumerate() {
        tree.insert(key, i as i32);
    }
    tree
}

fn random_tree(seed: u64, len: usize, span: i32) -> (Relaxed2, Vec<[i32; 2]>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = Relaxed2::default();
    let mut keys = Vec::with_capacity(len);
    for i in 0..len {
        let key = [rng.gen_range(0..span), rng.gen_range(0..span)];
        tree.insert(key, i as i32);
        keys.push(key);
    }
    (tree, keys)
}

fn random_strict(seed: u64, len: usize, span: i32) -> (Strict2, Vec<[i32; 2]>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = Strict2::default();
    let mut keys = Vec::with_capacity(len);
    for i in 0..len {
        let key = [rng.gen_range(0..span), rng.gen_range(0..span)];
        tree.insert(key, i as i32);
        keys.push(key);
    }
    (tree, keys)
}

#[test]
fn in_order_iter_covers_everything_both_ways() {
    let tree = relaxed_sample();
    let forward: Vec<[i32; 2]> = tree.iter().map(|(k, _)| *k).collect();
    assert_eq!(forward.len(), 6);
    let mut backward: Vec<[i32; 2]> = tree.iter().rev().map(|(k, _)| *k).collect();
    backward.reverse();
    assert_eq!(forward, backward);

    let empty = Relaxed2::default();
    assert_eq!(empty.iter().next(), None);
    assert_eq!(empty.iter().next_back(), None);
}

#[test]
fn in_order_steps_round_trip() {
    use crate::node::HEADER;
    let tree = random_tree(23, 120, 10).0;
    let core = &tree.core;
    let mut id = core.leftmost();
    while id != HEADER {
        let next = core.successor(id);
        if next != HEADER {
            assert_eq!(core.predecessor(next), id, "pred(succ(n)) must be n");
        }
        id = next;
    }
}

#[test]
fn mapping_yields_axis_sorted_order() {
    // Distinct x coordinates make the order fully deterministic.
    let expected = vec![[2, 3], [4, 7], [5, 4], [7, 2], [8, 1], [9, 6]];
    for keys in [
        strict_sample().mapping(0).map(|(k, _)| *k).collect::<Vec<_>>(),
        relaxed_sample().mapping(0).map(|(k, _)| *k).collect::<Vec<_>>(),
    ] {
        assert_eq!(keys, expected);
    }

    let by_y: Vec<[i32; 2]> = strict_sample().mapping(1).map(|(k, _)| *k).collect();
    assert_eq!(by_y, vec![[8, 1], [7, 2], [2, 3], [5, 4], [9, 6], [4, 7]]);
}

#[test]
fn mapping_is_complete_and_sorted_on_random_trees() {
    for seed in 0..8 {
        let (tree, mut keys) = random_tree(seed, 150, 12);
        for axis in 0..2 {
            let out: Vec<[i32; 2]> = tree.mapping(axis).map(|(k, _)| *k).collect();
            assert_eq!(out.len(), keys.len());
            for pair in out.windows(2) {
                assert!(pair[0][axis] <= pair[1][axis], "axis order violated");
            }
            let mut sorted_out = out.clone();
            sorted_out.sort();
            keys.sort();
            assert_eq!(sorted_out, keys, "mapping must enumerate the multiset");

            // The reverse direction is the exact mirror.
            let mut back: Vec<[i32; 2]> = tree.mapping(axis).rev().map(|(k, _)| *k).collect();
            back.reverse();
            assert_eq!(out, back);
        }
    }
}

#[test]
fn mapping_handles_heavy_duplication() {
    let (tree, keys) = random_tree(99, 200, 3);
    let out: Vec<[i32; 2]> = tree.mapping(0).map(|(k, _)| *k).collect();
    assert_eq!(out.len(), keys.len());
    for pair in out.windows(2) {
        assert!(pair[0][0] <= pair[1][0]);
    }
}

#[test]
fn mapping_meets_in_the_middle() {
    let tree = strict_sample();
    let mut iter = tree.mapping(0);
    let mut collected = Vec::new();
    loop {
        let Some((k, _)) = iter.next() else { break };
        collected.push(*k);
        let Some((k, _)) = iter.next_back() else { break };
        collected.push(*k);
    }
    assert_eq!(collected.len(), 6, "alternating ends must not duplicate");
    collected.sort();
    assert_eq!(collected, {
        let mut s = sample();
        s.sort();
        s
    });
}

#[test]
fn mapping_bounds_start_mid_sequence() {
    let tree = strict_sample();
    let from_five: Vec<i32> = tree.mapping_lower_bound(0, &[5, 0]).map(|(k, _)| k[0]).collect();
    assert_eq!(from_five, vec![5, 7, 8, 9]);
    let past_five: Vec<i32> = tree.mapping_upper_bound(0, &[5, 0]).map(|(k, _)| k[0]).collect();
    assert_eq!(past_five, vec![7, 8, 9]);
    let none: Vec<i32> = tree.mapping_lower_bound(0, &[10, 0]).map(|(k, _)| k[0]).collect();
    assert!(none.is_empty());
}

#[test]
fn range_scenario_box() {
    // The box [(4,2), (8,6)] holds exactly (5,4) and (7,2).
    for tree_keys in [
        {
            let t = strict_sample();
            let mut v: Vec<[i32; 2]> = t.range([4, 2], [8, 6]).map(|(k, _)| *k).collect();
            v.sort();
            v
        },
        {
            let t = relaxed_sample();
            let mut v: Vec<[i32; 2]> = t.range([4, 2], [8, 6]).map(|(k, _)| *k).collect();
            v.sort();
            v
        },
    ] {
        assert_eq!(tree_keys, vec![[5, 4], [7, 2]]);
    }
}

#[test]
fn range_is_complete_on_random_trees() {
    for seed in 0..8 {
        let (tree, keys) = random_tree(1000 + seed, 180, 16);
        let (strict, strict_keys) = random_strict(2000 + seed, 180, 16);
        let mut rng = StdRng::seed_from_u64(3000 + seed);
        for _ in 0..40 {
            let a = [rng.gen_range(0..16), rng.gen_range(0..16)];
            let b = [rng.gen_range(0..16), rng.gen_range(0..16)];
            let lo = [a[0].min(b[0]), a[1].min(b[1])];
            let hi = [a[0].max(b[0]), a[1].max(b[1])];

            let mut expect: Vec<[i32; 2]> = keys
                .iter()
                .filter(|k| (0..2).all(|ax| lo[ax] <= k[ax] && k[ax] <= hi[ax]))
                .copied()
                .collect();
            expect.sort();
            let mut got: Vec<[i32; 2]> = tree.range(lo, hi).map(|(k, _)| *k).collect();
            got.sort();
            assert_eq!(got, expect, "relaxed range completeness");

            let mut expect_s: Vec<[i32; 2]> = strict_keys
                .iter()
                .filter(|k| (0..2).all(|ax| lo[ax] <= k[ax] && k[ax] <= hi[ax]))
                .copied()
                .collect();
            expect_s.sort();
            let mut got_s: Vec<[i32; 2]> = strict.range(lo, hi).map(|(k, _)| *k).collect();
            got_s.sort();
            assert_eq!(got_s, expect_s, "strict range completeness");
        }
    }
}

#[test]
fn range_respects_in_order_and_reverses() {
    let (tree, _) = random_tree(77, 120, 10);
    let forward: Vec<[i32; 2]> = tree.range([2, 2], [7, 7]).map(|(k, _)| *k).collect();
    let mut backward: Vec<[i32; 2]> = tree.range([2, 2], [7, 7]).rev().map(|(k, _)| *k).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn open_region_excludes_its_bounds() {
    use crate::iter::OpenRegion;
    let tree = strict_sample();
    let inside: Vec<[i32; 2]> = tree
        .range_by(OpenRegion::new([4, 2], [8, 6], IndexLess))
        .map(|(k, _)| *k)
        .collect();
    // (7,2) sits on the open lower bound in y and is excluded.
    assert_eq!(inside, vec![[5, 4]]);
}

#[test]
fn empty_range_yields_nothing() {
    let tree = strict_sample();
    assert_eq!(tree.range([3, 3], [3, 3]).count(), 0);
    assert_eq!(tree.range([9, 9], [0, 0]).count(), 0, "inverted bounds");
    let empty = Strict2::default();
    assert_eq!(empty.range([0, 0], [100, 100]).count(), 0);
}

#[test]
fn equal_range_finds_every_duplicate() {
    let mut strict = strict_sample();
    let mut relaxed = relaxed_sample();
    strict.insert([5, 4], 100);
    relaxed.insert([5, 4], 100);

    for values in [
        {
            let model = [5, 4];
            let mut v: Vec<i32> = strict.equal_range(&model).map(|(_, v)| *v).collect();
            v.sort();
            v
        },
        {
            let model = [5, 4];
            let mut v: Vec<i32> = relaxed.equal_range(&model).map(|(_, v)| *v).collect();
            v.sort();
            v
        },
    ] {
        assert_eq!(values, vec![1, 100]);
    }

    let model = [3, 3];
    assert_eq!(strict.equal_range(&model).count(), 0);
}

#[test]
fn equal_range_is_complete_under_heavy_duplication() {
    for seed in 0..6 {
        let (tree, keys) = random_tree(4000 + seed, 160, 4);
        let (strict, strict_keys) = random_strict(5000 + seed, 160, 4);
        for x in 0..4 {
            for y in 0..4 {
                let model = [x, y];
                let expect = keys.iter().filter(|k| **k == model).count();
                assert_eq!(tree.equal_range(&model).count(), expect);
                let expect_s = strict_keys.iter().filter(|k| **k == model).count();
                assert_eq!(strict.equal_range(&model).count(), expect_s);
            }
        }
    }
}

#[test]
fn equal_range_reverses_cleanly() {
    let (tree, _) = random_tree(88, 120, 3);
    let model = [1, 1];
    let forward: Vec<i32> = tree.equal_range(&model).map(|(_, v)| *v).collect();
    let mut backward: Vec<i32> = tree.equal_range(&model).rev().map(|(_, v)| *v).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn neighbors_scenario_order() {
    // Squared distances from (6,3): (5,4) and (7,2) tie at 2 and resolve by
    // insertion order, then (8,1) at 8, (2,3) at 16, (9,6) at 18, (4,7) at
    // 20.
    let expected = vec![[5, 4], [7, 2], [8, 1], [2, 3], [9, 6], [4, 7]];
    let origin = [6, 3];
    for keys in [
        {
            let t = strict_sample();
            let v: Vec<[i32; 2]> = t.neighbors(&origin, SquareEuclidean).map(|(_, k, _)| *k).collect();
            v
        },
        {
            let t = relaxed_sample();
            let v: Vec<[i32; 2]> = t.neighbors(&origin, SquareEuclidean).map(|(_, k, _)| *k).collect();
            v
        },
    ] {
        assert_eq!(keys, expected);
    }
}

#[test]
fn neighbor_distances_never_decrease() {
    for seed in 0..8 {
        let (tree, keys) = random_tree(6000 + seed, 150, 20);
        let origin = [7, 11];
        let out: Vec<(i32, [i32; 2])> = tree
            .neighbors(&origin, SquareEuclidean)
            .map(|(d, k, _)| (d, *k))
            .collect();
        assert_eq!(out.len(), keys.len(), "every element must be enumerated");
        for pair in out.windows(2) {
            assert!(pair[0].0 <= pair[1].0, "distance order violated");
        }
        let brute_min = keys
            .iter()
            .map(|k| (k[0] - 7).pow(2) + (k[1] - 11).pow(2))
            .min()
            .unwrap();
        assert_eq!(out[0].0, brute_min, "first neighbor must be a true nearest");
    }
}

#[test]
fn neighbors_with_float_euclidean() {
    let mut tree: RelaxedKdTree<[f64; 2], (), StaticRank<2>> = RelaxedKdTree::default();
    for (x, y) in [(0.5, 0.5), (3.0, 4.0), (-1.0, 2.0), (10.0, -3.5)] {
        tree.insert([x, y], ());
    }
    let origin = [0.0, 0.0];
    let dists: Vec<f64> = tree.neighbors(&origin, Euclidean).map(|(d, _, _)| d).collect();
    assert_eq!(dists.len(), 4);
    assert!((dists[0] - 0.5_f64.hypot(0.5)).abs() < 1e-12);
    for pair in dists.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn manhattan_orders_by_taxicab_distance() {
    let tree = strict_sample();
    let origin = [6, 3];
    let out: Vec<(i32, [i32; 2])> = tree
        .neighbors(&origin, Manhattan)
        .map(|(d, k, _)| (d, *k))
        .collect();
    // |dx| + |dy| from (6,3): (5,4) and (7,2) tie at 2 again.
    assert_eq!(out[0], (2, [5, 4]));
    assert_eq!(out[1], (2, [7, 2]));
    for pair in out.windows(2) {
        assert!(pair[0].0 <= pair[1].0);
    }
}

#[test]
fn nearest_on_empty_tree_is_none() {
    let tree = Strict2::default();
    let origin = [0, 0];
    assert!(tree.nearest(&origin, SquareEuclidean).is_none());
}

#[test]
fn neighbors_cover_duplicates() {
    let mut tree = Relaxed2::default();
    for i in 0..10 {
        tree.insert([3, 3], i);
    }
    let origin = [0, 0];
    assert_eq!(tree.neighbors(&origin, SquareEuclidean).count(), 10);
}
