//! Best-first traversal by metric distance.

use std::cmp::Ordering;

use tinyvec::TinyVec;

use crate::compare::AxisCompare;
use crate::metric::Metric;
use crate::node::{NodeId, HEADER};
use crate::rank::Rank;
use crate::tree::core::{Core, WalkStack};

#[inline]
fn cmp_dist<D: PartialOrd>(a: D, b: D) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// True when (d1, n1) comes before (d2, n2) in (distance, id) order.
#[inline]
fn dist_lt<D: PartialOrd>(d1: D, n1: NodeId, d2: D, n2: NodeId) -> bool {
    match cmp_dist(d1, d2) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => n1 < n2,
    }
}

/// Least element in (distance, id) order strictly beyond `frontier`.
///
/// The search descends the side of each splitting hyperplane that holds the
/// origin first; the far side is entered only while its plane distance does
/// not exceed the best candidate, which is the geometric pruning bound of
/// the metric contract.
fn seek_after<K, V, R, C, M>(
    core: &Core<K, V, R, C>,
    origin: &K,
    metric: &M,
    frontier: Option<(M::Distance, NodeId)>,
) -> Option<(NodeId, M::Distance)>
where
    R: Rank,
    C: AxisCompare<K>,
    M: Metric<K>,
{
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let dims = core.dimensions();
    let mut best: Option<(NodeId, M::Distance)> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        let d = metric.distance_to_key(dims, origin, core.key(id));
        let beyond = match frontier {
            None => true,
            Some((fd, fid)) => dist_lt(fd, fid, d, id),
        };
        if beyond && best.map_or(true, |(b, bd)| dist_lt(d, id, bd, b)) {
            best = Some((id, d));
        }
        let axis = core.rank.axis_at(depth);
        let node = core.node(id);
        let near_left = core.cmp.less(axis, origin, core.key(id));
        let (near, far) = if near_left {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if far != HEADER {
            let plane = metric.distance_to_plane(dims, axis, origin, core.key(id));
            let skip = best
                .map_or(false, |(_, bd)| cmp_dist(plane, bd) == Ordering::Greater);
            if !skip {
                stack.push((far, depth + 1));
            }
        }
        if near != HEADER {
            stack.push((near, depth + 1));
        }
    }
    best
}

/// Enumeration of all elements by non-decreasing metric distance from an
/// origin key, distance ties broken by insertion slot.
///
/// The first element is a true nearest neighbor. Forward only: walking the
/// sequence from the far end would need per-subtree upper distance bounds,
/// which the metric contract does not supply.
#[derive(Clone)]
pub struct NeighborIter<'a, K, V, R, C, M: Metric<K>> {
    core: &'a Core<K, V, R, C>,
    origin: &'a K,
    metric: M,
    front: Option<(NodeId, M::Distance)>,
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>, M: Metric<K>> NeighborIter<'a, K, V, R, C, M> {
    pub(crate) fn new(core: &'a Core<K, V, R, C>, origin: &'a K, metric: M) -> Self {
        let front = seek_after(core, origin, &metric, None);
        Self {
            core,
            origin,
            metric,
            front,
        }
    }

    /// The query key distances are measured from.
    pub fn origin(&self) -> &K {
        self.origin
    }
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>, M: Metric<K>> Iterator
    for NeighborIter<'a, K, V, R, C, M>
{
    type Item = (M::Distance, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, d) = self.front?;
        self.front = seek_after(self.core, self.origin, &self.metric, Some((d, id)));
        let (key, value) = self.core.entry(id);
        Some((d, key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.core.len))
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>, M: Metric<K>> std::iter::FusedIterator
    for NeighborIter<'_, K, V, R, C, M>
{
}
