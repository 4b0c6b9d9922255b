//! The self-rebalancing k-d tree.

use tinyvec::TinyVec;

use crate::compare::AxisCompare;
use crate::error::Result;
use crate::iter::{
    equal, mapping, ClosedRegion, EqualIter, IntoIter, Iter, MappingIter, NeighborIter, RangeIter,
    RegionPredicate,
};
use crate::metric::Metric;
use crate::node::{NodeId, Position, HEADER};
use crate::rank::{DynamicRank, Rank};

use super::core::{Core, Flavor};

/// Decides when a node's subtrees are too lopsided to tolerate.
///
/// Consulted after every single-element mutation with the weights of the
/// two subtrees of each node along the mutated path; the first node it
/// rejects is rebuilt into median-split shape. A policy must accept
/// perfectly balanced subtrees or rebuilding cannot terminate.
pub trait BalancingPolicy {
    /// True when subtrees of weight `left` and `right` must be rebuilt.
    fn may_unbalance(&self, dimensions: usize, left: usize, right: usize) -> bool;
}

/// Tolerates one subtree outweighing the other about two to one.
///
/// Rebuilds are rare and traversals stay within a small constant of the
/// balanced depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LooseBalancing;

impl BalancingPolicy for LooseBalancing {
    #[inline]
    fn may_unbalance(&self, _dimensions: usize, left: usize, right: usize) -> bool {
        let (heavier, lighter) = if left > right {
            (left, right)
        } else {
            (right, left)
        };
        heavier > 2 * (lighter + 1)
    }
}

/// Keeps subtrees within roughly four to three of each other. Rebuilds more
/// often than [`LooseBalancing`] in exchange for shorter search paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TightBalancing;

impl BalancingPolicy for TightBalancing {
    #[inline]
    fn may_unbalance(&self, _dimensions: usize, left: usize, right: usize) -> bool {
        let (heavier, lighter) = if left > right {
            (left, right)
        } else {
            (right, left)
        };
        3 * heavier > 4 * (lighter + 1)
    }
}

/// A k-d tree that rebalances itself on every mutation.
///
/// Each node carries the weight of its subtree. After an insertion or an
/// erasure the balancing policy is consulted along the mutated path, and the
/// topmost node it rejects is rebuilt by median split, which bounds the
/// depth logarithmically for either provided policy. Equal keys may end up
/// on either side of a partition (insertion sends them toward the lighter
/// subtree), so query pruning is a little wider than in [`KdTree`].
///
/// Same query surface as [`KdTree`]; see the method docs there for the
/// contracts.
///
/// ```
/// use kd_index::RelaxedKdTree;
///
/// let mut tree: RelaxedKdTree<[i32; 2], i32> = RelaxedKdTree::with_dimensions(2).unwrap();
/// for i in 0..100 {
///     tree.insert([i, 0], i);
/// }
/// let origin = [40, 1];
/// let (_, nearest, _) = tree.nearest(&origin, kd_index::SquareEuclidean).unwrap();
/// assert_eq!(nearest, &[40, 0]);
/// ```
///
/// [`KdTree`]: crate::KdTree
#[derive(Clone)]
pub struct RelaxedKdTree<
    K,
    V,
    R = DynamicRank,
    C = crate::compare::IndexLess,
    P = LooseBalancing,
> {
    pub(crate) core: Core<K, V, R, C>,
    policy: P,
}

impl<K, V, R: Rank, C: AxisCompare<K>, P: BalancingPolicy> RelaxedKdTree<K, V, R, C, P> {
    /// Build an empty tree from rank and comparator, with the default
    /// policy.
    pub fn new(rank: R, cmp: C) -> Self
    where
        P: Default,
    {
        Self::with_policy(rank, cmp, P::default())
    }

    /// Build an empty tree from all three collaborators.
    pub fn with_policy(rank: R, cmp: C, policy: P) -> Self {
        Self {
            core: Core::new(rank, cmp, Flavor::Relaxed),
            policy,
        }
    }

    /// The number of coordinate axes of keys.
    pub fn dimensions(&self) -> usize {
        self.core.dimensions()
    }

    pub fn comparator(&self) -> &C {
        &self.core.cmp
    }

    pub fn rank(&self) -> &R {
        &self.core.rank
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Number of stored elements. Constant time.
    pub fn len(&self) -> usize {
        self.core.len
    }

    pub fn is_empty(&self) -> bool {
        self.core.len == 0
    }

    /// See [`KdTree::max_len`](crate::KdTree::max_len).
    pub fn max_len(&self) -> usize {
        (u32::MAX - 1) as usize
    }

    /// Drop every element. Slot capacity is retained.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Exchange the entire contents and all collaborators of two trees.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Insert an element, rebalancing where the policy demands it.
    ///
    /// The handle stays valid across later rebuilds; rebuilding relinks
    /// nodes without moving elements between slots.
    pub fn insert(&mut self, key: K, value: V) -> Position {
        let id = self.core.alloc(key, value);
        self.link_new(id);
        self.core.position(id)
    }

    /// Fallible [`insert`](RelaxedKdTree::insert); on error the tree is
    /// unchanged.
    ///
    /// ## Errors
    ///
    /// - [`KdIndexError::AllocFailed`](crate::KdIndexError::AllocFailed)
    ///   when the node reservation fails.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Position> {
        self.core.try_reserve_node()?;
        Ok(self.insert(key, value))
    }

    fn link_new(&mut self, id: NodeId) {
        self.core.len += 1;
        let root = self.core.root();
        if root == HEADER {
            let header = self.core.node_mut(HEADER);
            header.parent = id;
            header.left = id;
            header.right = id;
            return;
        }
        let mut path: TinyVec<[NodeId; 32]> = TinyVec::new();
        let mut cur = root;
        let mut depth = 0;
        loop {
            path.push(cur);
            self.core.node_mut(cur).weight += 1;
            let axis = self.core.rank.axis_at(depth);
            let node_key = self.core.key(cur);
            let new_key = self.core.key(id);
            let goes_left = if self.core.cmp.less(axis, new_key, node_key) {
                true
            } else if self.core.cmp.less(axis, node_key, new_key) {
                false
            } else {
                // Tied on the split axis: lean toward the lighter side.
                let n = self.core.node(cur);
                self.core.node(n.left).weight <= self.core.node(n.right).weight
            };
            let next = if goes_left {
                self.core.node(cur).left
            } else {
                self.core.node(cur).right
            };
            if next == HEADER {
                if goes_left {
                    self.core.node_mut(cur).left = id;
                    if self.core.leftmost() == cur {
                        self.core.node_mut(HEADER).left = id;
                    }
                } else {
                    self.core.node_mut(cur).right = id;
                    if self.core.rightmost() == cur {
                        self.core.node_mut(HEADER).right = id;
                    }
                }
                self.core.node_mut(id).parent = cur;
                break;
            }
            cur = next;
            depth += 1;
        }
        // Rebuild at the topmost node the policy rejects, if any.
        for (d, &ancestor) in path.iter().enumerate() {
            if self.unbalanced(ancestor) {
                self.core.rebuild_subtree(ancestor, d);
                break;
            }
        }
    }

    fn unbalanced(&self, id: NodeId) -> bool {
        let n = self.core.node(id);
        let left = self.core.node(n.left).weight as usize;
        let right = self.core.node(n.right).weight as usize;
        self.policy
            .may_unbalance(self.core.dimensions(), left, right)
    }

    /// Erase the element a handle points at, rebalancing where the policy
    /// demands it. Returns `None` when the handle is stale.
    pub fn erase_at(&mut self, pos: Position) -> Option<(K, V)> {
        let id = self.core.resolve(pos)?;
        let path = self.core.path_from_root(id);
        let depth = path.len() - 1;
        for &ancestor in &path[..depth] {
            self.core.node_mut(ancestor).weight -= 1;
        }
        let mut touched = self.core.remove_from(id, depth);
        let entry = self.core.release(id);
        self.core.len -= 1;
        self.core.refresh_extremes();

        // Every weight change sits on one root-to-leaf path: the surviving
        // ancestors, then the nodes the displacement touched. Scan top-down
        // and rebuild at the topmost offender only.
        touched.sort_unstable_by_key(|&(_, d)| d);
        for (d, &ancestor) in path[..depth].iter().enumerate() {
            if self.unbalanced(ancestor) {
                self.core.rebuild_subtree(ancestor, d);
                return Some(entry);
            }
        }
        for &(node, d) in touched.iter() {
            if self.unbalanced(node) {
                self.core.rebuild_subtree(node, d);
                break;
            }
        }
        Some(entry)
    }

    /// Erase every element coordinate-equivalent to `key`; returns how many
    /// were removed.
    pub fn erase(&mut self, key: &K) -> usize {
        let mut count = 0;
        while let Some(pos) = self.find_position(key) {
            self.erase_at(pos);
            count += 1;
        }
        count
    }

    /// See [`KdTree::find`](crate::KdTree::find).
    pub fn find(&self, key: &K) -> Option<(&K, &V)> {
        equal::equal_first(&self.core, key).map(|(id, _)| self.core.entry(id))
    }

    /// See [`KdTree::find_position`](crate::KdTree::find_position).
    pub fn find_position(&self, key: &K) -> Option<Position> {
        equal::equal_first(&self.core, key).map(|(id, _)| self.core.position(id))
    }

    /// See [`KdTree::find_if`](crate::KdTree::find_if).
    pub fn find_if<'a, F>(&'a self, key: &'a K, mut pred: F) -> Option<(&'a K, &'a V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.equal_range(key).find(|&(k, v)| pred(k, v))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, pos: Position) -> Option<(&K, &V)> {
        self.core.resolve(pos).map(|id| self.core.entry(id))
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut V> {
        let id = self.core.resolve(pos)?;
        Some(&mut self.core.node_mut(id).entry.as_mut().unwrap().1)
    }

    /// Geometric in-order traversal of all elements.
    pub fn iter(&self) -> Iter<'_, K, V, R, C> {
        Iter::new(&self.core)
    }

    /// See [`KdTree::equal_range`](crate::KdTree::equal_range).
    pub fn equal_range<'a>(&'a self, model: &'a K) -> EqualIter<'a, K, V, R, C> {
        EqualIter::new(&self.core, model)
    }

    /// See [`KdTree::range`](crate::KdTree::range).
    pub fn range(&self, lower: K, upper: K) -> RangeIter<'_, K, V, R, C, ClosedRegion<K, C>>
    where
        C: Clone,
    {
        self.range_by(ClosedRegion::new(lower, upper, self.core.cmp.clone()))
    }

    /// See [`KdTree::range_by`](crate::KdTree::range_by).
    pub fn range_by<Q: RegionPredicate<K>>(&self, predicate: Q) -> RangeIter<'_, K, V, R, C, Q> {
        RangeIter::new(&self.core, predicate)
    }

    /// See [`KdTree::mapping`](crate::KdTree::mapping).
    ///
    /// ## Panics
    ///
    /// When `axis` is not below [`dimensions`](RelaxedKdTree::dimensions).
    pub fn mapping(&self, axis: usize) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        MappingIter::new(&self.core, axis)
    }

    /// See [`KdTree::mapping_lower_bound`](crate::KdTree::mapping_lower_bound).
    pub fn mapping_lower_bound(&self, axis: usize, bound: &K) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        let front = mapping::mapping_lower_bound(&self.core, axis, bound);
        MappingIter::with_front(&self.core, axis, front)
    }

    /// See [`KdTree::mapping_upper_bound`](crate::KdTree::mapping_upper_bound).
    pub fn mapping_upper_bound(&self, axis: usize, bound: &K) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        let front = mapping::mapping_upper_bound(&self.core, axis, bound);
        MappingIter::with_front(&self.core, axis, front)
    }

    /// See [`KdTree::neighbors`](crate::KdTree::neighbors).
    pub fn neighbors<'a, M: Metric<K>>(
        &'a self,
        origin: &'a K,
        metric: M,
    ) -> NeighborIter<'a, K, V, R, C, M> {
        NeighborIter::new(&self.core, origin, metric)
    }

    /// See [`KdTree::nearest`](crate::KdTree::nearest).
    pub fn nearest<'a, M: Metric<K>>(
        &'a self,
        origin: &'a K,
        metric: M,
    ) -> Option<(M::Distance, &'a K, &'a V)> {
        self.neighbors(origin, metric).next()
    }

    /// A structurally independent, fully rebalanced copy.
    pub fn to_balanced(&self) -> Self
    where
        K: Clone,
        V: Clone,
        C: Clone,
        P: Clone,
    {
        let elems: Vec<(K, V)> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut out = Self::with_policy(
            self.core.rank.clone(),
            self.core.cmp.clone(),
            self.policy.clone(),
        );
        out.core.bulk_build(elems);
        out
    }
}

impl<K, V, C: AxisCompare<K> + Default, P: BalancingPolicy + Default>
    RelaxedKdTree<K, V, DynamicRank, C, P>
{
    /// Build an empty tree with a rank chosen at run time.
    ///
    /// ## Errors
    ///
    /// - [`KdIndexError::InvalidRank`](crate::KdIndexError::InvalidRank)
    ///   when `dimensions` is zero.
    pub fn with_dimensions(dimensions: usize) -> Result<Self> {
        Ok(Self::new(DynamicRank::new(dimensions)?, C::default()))
    }
}

impl<K, V, R, C, P> Default for RelaxedKdTree<K, V, R, C, P>
where
    R: Rank + Default,
    C: AxisCompare<K> + Default,
    P: BalancingPolicy + Default,
{
    fn default() -> Self {
        Self::new(R::default(), C::default())
    }
}

impl<K, V, R, C, P> FromIterator<(K, V)> for RelaxedKdTree<K, V, R, C, P>
where
    R: Rank + Default,
    C: AxisCompare<K> + Default,
    P: BalancingPolicy + Default,
{
    /// Bulk median-split build; no rebalancing is ever triggered by it.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.core.bulk_build(iter.into_iter().collect());
        tree
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>, P: BalancingPolicy> Extend<(K, V)>
    for RelaxedKdTree<K, V, R, C, P>
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>, P: BalancingPolicy> IntoIterator
    for RelaxedKdTree<K, V, R, C, P>
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.core.into_iter_inner()
    }
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>, P: BalancingPolicy> IntoIterator
    for &'a RelaxedKdTree<K, V, R, C, P>
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, R, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>, P> std::fmt::Debug for RelaxedKdTree<K, V, R, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaxedKdTree")
            .field("len", &self.core.len)
            .field("dimensions", &self.core.dimensions())
            .finish_non_exhaustive()
    }
}
