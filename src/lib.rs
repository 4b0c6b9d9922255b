//! In-memory k-dimensional indexing containers.
//!
//! This crate provides ordered associative containers keyed by points in a
//! user-defined k-dimensional space: set-like and map-like, with the
//! dimensionality fixed at compile time ([`StaticRank`]) or chosen at run
//! time ([`DynamicRank`]), and the per-axis ordering supplied by an
//! [`AxisCompare`] implementation.
//!
//! ## Trees
//!
//! Two engines share one surface. [`KdTree`] never rebalances: cheap
//! mutations, shape at the mercy of insertion order. [`RelaxedKdTree`]
//! carries subtree weights and consults a [`BalancingPolicy`] on every
//! mutation, rebuilding the topmost out-of-tolerance subtree by median
//! split, which keeps its depth logarithmic. The façade aliases
//! ([`PointSet`], [`PointMap`], [`BoxSet`], [`BoxMap`] and their `Runtime`
//! variants) are parameter bindings over the relaxed tree.
//!
//! ## Queries
//!
//! Besides exact lookup ([`KdTree::find`]), every tree surfaces four
//! geometry-aware traversals, each an ordinary iterator borrowing the tree:
//!
//! - [`mapping`](KdTree::mapping): all elements ascending along one axis;
//! - [`range`](KdTree::range) / [`range_by`](KdTree::range_by): elements
//!   inside an orthogonal region;
//! - [`equal_range`](KdTree::equal_range): elements coordinate-equivalent
//!   to a model key;
//! - [`neighbors`](KdTree::neighbors): elements by non-decreasing
//!   [`Metric`] distance from an origin.
//!
//! ## Example
//!
//! ```
//! use kd_index::{PointMap, SquareEuclidean};
//!
//! let mut map = PointMap::<[i32; 2], &str, 2>::default();
//! map.insert([2, 3], "a");
//! map.insert([5, 4], "b");
//! map.insert([9, 6], "c");
//! map.insert([4, 7], "d");
//!
//! // Ascending along the x axis.
//! let xs: Vec<i32> = map.mapping(0).map(|(k, _)| k[0]).collect();
//! assert_eq!(xs, vec![2, 4, 5, 9]);
//!
//! // Orthogonal range query, bounds included. Traversal order is
//! // tree-dependent.
//! let mut inside: Vec<&str> = map.range([3, 3], [6, 8]).map(|(_, v)| *v).collect();
//! inside.sort();
//! assert_eq!(inside, vec!["b", "d"]);
//!
//! // Nearest neighbor.
//! let origin = [6, 3];
//! let (_, key, _) = map.nearest(&origin, SquareEuclidean).unwrap();
//! assert_eq!(key, &[5, 4]);
//! ```

mod compare;
mod containers;
mod error;
pub mod iter;
mod metric;
mod node;
mod rank;
mod tree;

pub use compare::{AxisCompare, IndexLess};
pub use containers::{
    BoxMap, BoxSet, PointMap, PointSet, RuntimeBoxMap, RuntimeBoxSet, RuntimePointMap,
    RuntimePointSet,
};
pub use error::{KdIndexError, Result};
pub use iter::{AxisOrder, ClosedRegion, OpenRegion, RegionPredicate};
pub use metric::{Euclidean, Manhattan, Metric, SquareEuclidean};
pub use node::Position;
pub use rank::{DynamicRank, Rank, StaticRank};
pub use tree::{BalancingPolicy, KdTree, LooseBalancing, RelaxedKdTree, TightBalancing};

#[cfg(test)]
mod proptests;
