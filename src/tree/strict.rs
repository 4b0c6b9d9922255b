//! The strict k-d tree.

use crate::compare::AxisCompare;
use crate::error::Result;
use crate::iter::{
    equal, mapping, EqualIter, Iter, MappingIter, NeighborIter, RangeIter, RegionPredicate,
};
use crate::iter::{ClosedRegion, IntoIter};
use crate::metric::Metric;
use crate::node::{Position, HEADER};
use crate::rank::{DynamicRank, Rank};

use super::core::{Core, Flavor};

/// A k-d tree that never rebalances.
///
/// Insertion and erasure preserve the partition invariant with equal keys
/// kept out of left subtrees, and never restructure more than the erase
/// displacement path. The shape therefore depends on insertion order; feed
/// it pre-sorted data and it degenerates like an unbalanced binary search
/// tree. Build it in bulk (`FromIterator`, [`KdTree::to_balanced`]) for a
/// median-split shape, or use [`RelaxedKdTree`](crate::RelaxedKdTree) when
/// the workload interleaves mutation with queries.
///
/// Duplicate keys are permitted; each occupies its own node.
///
/// ```
/// use kd_index::{KdTree, StaticRank};
///
/// let mut tree: KdTree<[i32; 2], &str, StaticRank<2>> = KdTree::default();
/// tree.insert([2, 3], "a");
/// tree.insert([5, 4], "b");
/// tree.insert([9, 6], "c");
///
/// assert_eq!(tree.find(&[5, 4]), Some((&[5, 4], &"b")));
/// let inside: Vec<_> = tree.range([0, 0], [6, 9]).map(|(k, _)| *k).collect();
/// assert_eq!(inside.len(), 2);
/// ```
#[derive(Clone)]
pub struct KdTree<K, V, R = DynamicRank, C = crate::compare::IndexLess> {
    pub(crate) core: Core<K, V, R, C>,
}

impl<K, V, R: Rank, C: AxisCompare<K>> KdTree<K, V, R, C> {
    /// Build an empty tree from its collaborators.
    pub fn new(rank: R, cmp: C) -> Self {
        Self {
            core: Core::new(rank, cmp, Flavor::Strict),
        }
    }

    /// The number of coordinate axes of keys.
    pub fn dimensions(&self) -> usize {
        self.core.dimensions()
    }

    /// The comparator the tree was built with.
    pub fn comparator(&self) -> &C {
        &self.core.cmp
    }

    /// The rank the tree was built with.
    pub fn rank(&self) -> &R {
        &self.core.rank
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.core.len
    }

    pub fn is_empty(&self) -> bool {
        self.core.len == 0
    }

    /// Upper bound on the number of elements a tree can ever hold, fixed by
    /// the 32-bit node id space.
    pub fn max_len(&self) -> usize {
        (u32::MAX - 1) as usize
    }

    /// Drop every element. Slot capacity is retained.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Exchange the entire contents, rank and comparator of two trees.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Insert an element, returning a handle to it.
    ///
    /// Duplicates of an existing key are stored as their own elements.
    pub fn insert(&mut self, key: K, value: V) -> Position {
        let id = self.core.alloc(key, value);
        self.link_new(id);
        self.core.position(id)
    }

    /// Fallible [`insert`](KdTree::insert): node storage is reserved before
    /// anything is linked, so on error the tree is unchanged.
    ///
    /// ## Errors
    ///
    /// - [`KdIndexError::AllocFailed`](crate::KdIndexError::AllocFailed)
    ///   when the reservation fails.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Position> {
        self.core.try_reserve_node()?;
        Ok(self.insert(key, value))
    }

    fn link_new(&mut self, id: crate::node::NodeId) {
        self.core.len += 1;
        let root = self.core.root();
        if root == HEADER {
            let header = self.core.node_mut(HEADER);
            header.parent = id;
            header.left = id;
            header.right = id;
            return;
        }
        let mut cur = root;
        let mut depth = 0;
        loop {
            self.core.node_mut(cur).weight += 1;
            let axis = self.core.rank.axis_at(depth);
            let goes_left = self.core.cmp.less(axis, self.core.key(id), self.core.key(cur));
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
                return;
            }
            cur = next;
            depth += 1;
        }
    }

    /// Erase the element a handle points at and return it, or `None` when
    /// the handle is stale.
    pub fn erase_at(&mut self, pos: Position) -> Option<(K, V)> {
        let id = self.core.resolve(pos)?;
        let path = self.core.path_from_root(id);
        let depth = path.len() - 1;
        for &ancestor in &path[..depth] {
            self.core.node_mut(ancestor).weight -= 1;
        }
        let _ = self.core.remove_from(id, depth);
        let entry = self.core.release(id);
        self.core.len -= 1;
        self.core.refresh_extremes();
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

    /// Some element coordinate-equivalent to `key`, or `None`.
    pub fn find(&self, key: &K) -> Option<(&K, &V)> {
        equal::equal_first(&self.core, key).map(|(id, _)| self.core.entry(id))
    }

    /// A handle to some element coordinate-equivalent to `key`.
    pub fn find_position(&self, key: &K) -> Option<Position> {
        equal::equal_first(&self.core, key).map(|(id, _)| self.core.position(id))
    }

    /// The first element equivalent to `key` that also satisfies `pred`.
    pub fn find_if<'a, F>(&'a self, key: &'a K, mut pred: F) -> Option<(&'a K, &'a V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.equal_range(key).find(|&(k, v)| pred(k, v))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// The element behind a handle, or `None` when it is stale.
    pub fn get(&self, pos: Position) -> Option<(&K, &V)> {
        self.core.resolve(pos).map(|id| self.core.entry(id))
    }

    /// Mutable access to the payload behind a handle. Keys are never
    /// mutable; changing one would silently break the partition.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut V> {
        let id = self.core.resolve(pos)?;
        Some(&mut self.core.node_mut(id).entry.as_mut().unwrap().1)
    }

    /// Geometric in-order traversal of all elements.
    pub fn iter(&self) -> Iter<'_, K, V, R, C> {
        Iter::new(&self.core)
    }

    /// Pre-order traversal of every element coordinate-equivalent to
    /// `model`.
    pub fn equal_range<'a>(&'a self, model: &'a K) -> EqualIter<'a, K, V, R, C> {
        EqualIter::new(&self.core, model)
    }

    /// Elements inside the closed box `[lower, upper]`, in-order.
    pub fn range(&self, lower: K, upper: K) -> RangeIter<'_, K, V, R, C, ClosedRegion<K, C>>
    where
        C: Clone,
    {
        self.range_by(ClosedRegion::new(lower, upper, self.core.cmp.clone()))
    }

    /// Elements inside an arbitrary orthogonal region, in-order.
    pub fn range_by<P: RegionPredicate<K>>(&self, predicate: P) -> RangeIter<'_, K, V, R, C, P> {
        RangeIter::new(&self.core, predicate)
    }

    /// All elements in ascending order along `axis`.
    ///
    /// ## Panics
    ///
    /// When `axis` is not below [`dimensions`](KdTree::dimensions).
    pub fn mapping(&self, axis: usize) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        MappingIter::new(&self.core, axis)
    }

    /// Like [`mapping`](KdTree::mapping), starting at the first element not
    /// less than `bound` on `axis`.
    pub fn mapping_lower_bound(&self, axis: usize, bound: &K) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        let front = mapping::mapping_lower_bound(&self.core, axis, bound);
        MappingIter::with_front(&self.core, axis, front)
    }

    /// Like [`mapping`](KdTree::mapping), starting at the first element
    /// greater than `bound` on `axis`.
    pub fn mapping_upper_bound(&self, axis: usize, bound: &K) -> MappingIter<'_, K, V, R, C> {
        assert!(axis < self.dimensions(), "mapping axis out of range");
        let front = mapping::mapping_upper_bound(&self.core, axis, bound);
        MappingIter::with_front(&self.core, axis, front)
    }

    /// All elements by non-decreasing `metric` distance from `origin`.
    pub fn neighbors<'a, M: Metric<K>>(
        &'a self,
        origin: &'a K,
        metric: M,
    ) -> NeighborIter<'a, K, V, R, C, M> {
        NeighborIter::new(&self.core, origin, metric)
    }

    /// A nearest element under `metric`, with its distance.
    pub fn nearest<'a, M: Metric<K>>(
        &'a self,
        origin: &'a K,
        metric: M,
    ) -> Option<(M::Distance, &'a K, &'a V)> {
        self.neighbors(origin, metric).next()
    }

    /// A structurally independent copy rebuilt into median-split shape.
    pub fn to_balanced(&self) -> Self
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        let elems: Vec<(K, V)> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut out = Self::new(self.core.rank.clone(), self.core.cmp.clone());
        out.core.bulk_build(elems);
        out
    }
}

impl<K, V, C: AxisCompare<K> + Default> KdTree<K, V, DynamicRank, C> {
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

impl<K, V, R: Rank + Default, C: AxisCompare<K> + Default> Default for KdTree<K, V, R, C> {
    fn default() -> Self {
        Self::new(R::default(), C::default())
    }
}

impl<K, V, R: Rank + Default, C: AxisCompare<K> + Default> FromIterator<(K, V)>
    for KdTree<K, V, R, C>
{
    /// Bulk median-split build; the result is balanced regardless of input
    /// order.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.core.bulk_build(iter.into_iter().collect());
        tree
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> Extend<(K, V)> for KdTree<K, V, R, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> IntoIterator for KdTree<K, V, R, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.core.into_iter_inner()
    }
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>> IntoIterator for &'a KdTree<K, V, R, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, R, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> std::fmt::Debug for KdTree<K, V, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.core.len)
            .field("dimensions", &self.core.dimensions())
            .finish_non_exhaustive()
    }
}
