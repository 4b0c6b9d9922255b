//! Thin façade containers: parameter bindings over the engine.
//!
//! Point containers store keys that are points of `N` axes. Box containers
//! store axis-aligned boxes as points of doubled rank, low corner axes
//! first, then high corner axes; an overlap or enclosure query is then an
//! orthogonal range over those `2 * N` axes. The `Runtime` variants pick
//! the rank at construction through `with_dimensions`.
//!
//! All aliases bind the relaxed, self-rebalancing tree with loose
//! balancing. Every collaborator handed to a constructor is stored; nothing
//! is silently dropped.

use crate::compare::{AxisCompare, IndexLess};
use crate::node::Position;
use crate::rank::{DynamicRank, Rank, StaticRank};
use crate::tree::{BalancingPolicy, KdTree, LooseBalancing, RelaxedKdTree};

/// Set of points with `N` axes.
pub type PointSet<P, const N: usize, C = IndexLess> =
    RelaxedKdTree<P, (), StaticRank<N>, C, LooseBalancing>;

/// Map from points with `N` axes to payloads.
pub type PointMap<P, T, const N: usize, C = IndexLess> =
    RelaxedKdTree<P, T, StaticRank<N>, C, LooseBalancing>;

/// Set of boxes stored on `N2 = 2 × rank` axes.
pub type BoxSet<B, const N2: usize, C = IndexLess> =
    RelaxedKdTree<B, (), StaticRank<N2>, C, LooseBalancing>;

/// Map from boxes stored on `N2 = 2 × rank` axes to payloads.
pub type BoxMap<B, T, const N2: usize, C = IndexLess> =
    RelaxedKdTree<B, T, StaticRank<N2>, C, LooseBalancing>;

/// [`PointSet`] with the rank chosen at run time.
pub type RuntimePointSet<P, C = IndexLess> = RelaxedKdTree<P, (), DynamicRank, C, LooseBalancing>;

/// [`PointMap`] with the rank chosen at run time.
pub type RuntimePointMap<P, T, C = IndexLess> =
    RelaxedKdTree<P, T, DynamicRank, C, LooseBalancing>;

/// [`BoxSet`] with the rank chosen at run time.
pub type RuntimeBoxSet<B, C = IndexLess> = RelaxedKdTree<B, (), DynamicRank, C, LooseBalancing>;

/// [`BoxMap`] with the rank chosen at run time.
pub type RuntimeBoxMap<B, T, C = IndexLess> = RelaxedKdTree<B, T, DynamicRank, C, LooseBalancing>;

impl<K, R: Rank, C: AxisCompare<K>, P: BalancingPolicy> RelaxedKdTree<K, (), R, C, P> {
    /// Set-flavored insert.
    pub fn insert_key(&mut self, key: K) -> Position {
        self.insert(key, ())
    }
}

impl<K, R: Rank, C: AxisCompare<K>> KdTree<K, (), R, C> {
    /// Set-flavored insert.
    pub fn insert_key(&mut self, key: K) -> Position {
        self.insert(key, ())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn facades_are_engine_bindings() {
        let mut set = PointSet::<[i32; 2], 2>::default();
        set.insert_key([1, 2]);
        set.insert_key([1, 2]);
        set.insert_key([3, 0]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.erase(&[1, 2]), 2);

        let mut map: RuntimePointMap<Vec<i64>, &str> =
            RuntimePointMap::with_dimensions(3).unwrap();
        map.insert(vec![0, 0, 0], "origin");
        assert!(map.contains(&vec![0, 0, 0]));
    }

    #[test]
    fn boxes_use_doubled_axes() {
        // 1-dimensional intervals, stored as (low, high) pairs.
        let mut boxes = BoxSet::<[i32; 2], 2>::default();
        boxes.insert_key([0, 4]);
        boxes.insert_key([3, 9]);
        boxes.insert_key([10, 12]);
        // Intervals overlapping [2, 5]: low <= 5 and high >= 2.
        let overlapping: Vec<[i32; 2]> = boxes
            .range([i32::MIN, 2], [5, i32::MAX])
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(overlapping.len(), 2);
    }
}
