//! Traversal in ascending order along one axis.
//!
//! The tree is not a search tree on any single axis, so each step is a
//! pruned descent from the root looking for the least element beyond the
//! current one. Elements are ordered by (key on the mapping axis, node id);
//! the id tie-break makes the order total and the traversal reversible with
//! duplicate keys present.

use tinyvec::TinyVec;

use crate::compare::AxisCompare;
use crate::node::{NodeId, HEADER};
use crate::rank::Rank;
use crate::tree::core::{Core, Flavor, WalkStack};

/// True when `a` comes before `b` in (key on `axis`, id) order.
fn axis_lt<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
    a: NodeId,
    b: NodeId,
) -> bool {
    if core.cmp.less(axis, core.key(a), core.key(b)) {
        true
    } else if core.cmp.less(axis, core.key(b), core.key(a)) {
        false
    } else {
        a < b
    }
}

/// Least element in (key, id) order, or `None` on an empty tree.
pub(crate) fn mapping_minimum<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
) -> Option<NodeId> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if best.map_or(true, |b| axis_lt(core, axis, id, b)) {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.right != HEADER {
            // Right keys are not less than this node on the split axis;
            // when that axis is the mapping axis they only matter on a tie
            // with the best.
            let b = best.unwrap();
            if split != axis || !core.cmp.less(axis, core.key(b), core.key(id)) {
                stack.push((node.right, depth + 1));
            }
        }
        if node.left != HEADER {
            stack.push((node.left, depth + 1));
        }
    }
    best
}

/// Greatest element in (key, id) order.
pub(crate) fn mapping_maximum<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
) -> Option<NodeId> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if best.map_or(true, |b| axis_lt(core, axis, b, id)) {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.left != HEADER {
            let b = best.unwrap();
            let descend = split != axis
                || match core.flavor {
                    // Strict left subtrees are strictly below this node, so
                    // they can only beat a best that is below it too.
                    Flavor::Strict => core.cmp.less(axis, core.key(b), core.key(id)),
                    Flavor::Relaxed => !core.cmp.less(axis, core.key(id), core.key(b)),
                };
            if descend {
                stack.push((node.left, depth + 1));
            }
        }
        if node.right != HEADER {
            stack.push((node.right, depth + 1));
        }
    }
    best
}

/// Least element strictly beyond `cur` in (key, id) order.
pub(crate) fn mapping_successor<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
    cur: NodeId,
) -> Option<NodeId> {
    let root = core.root();
    debug_assert_ne!(root, HEADER);
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if axis_lt(core, axis, cur, id) && best.map_or(true, |b| axis_lt(core, axis, id, b)) {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.right != HEADER {
            let descend = split != axis
                || best.map_or(true, |b| !core.cmp.less(axis, core.key(b), core.key(id)));
            if descend {
                stack.push((node.right, depth + 1));
            }
        }
        if node.left != HEADER {
            // The left subtree can hold something beyond `cur` only when
            // this node itself is beyond it on the mapping axis; a strict
            // tree additionally rules out ties.
            let descend = split != axis
                || match core.flavor {
                    Flavor::Strict => core.cmp.less(axis, core.key(cur), core.key(id)),
                    Flavor::Relaxed => !core.cmp.less(axis, core.key(id), core.key(cur)),
                };
            if descend {
                stack.push((node.left, depth + 1));
            }
        }
    }
    best
}

/// Greatest element strictly before `cur` in (key, id) order.
pub(crate) fn mapping_predecessor<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
    cur: NodeId,
) -> Option<NodeId> {
    let root = core.root();
    debug_assert_ne!(root, HEADER);
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if axis_lt(core, axis, id, cur) && best.map_or(true, |b| axis_lt(core, axis, b, id)) {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.left != HEADER {
            let descend = split != axis
                || best.map_or(true, |b| match core.flavor {
                    Flavor::Strict => core.cmp.less(axis, core.key(b), core.key(id)),
                    Flavor::Relaxed => !core.cmp.less(axis, core.key(id), core.key(b)),
                });
            if descend {
                stack.push((node.left, depth + 1));
            }
        }
        if node.right != HEADER {
            // Right keys are at least this node's key, so anything before
            // `cur` there requires the node not to be beyond `cur`.
            let descend = split != axis || !core.cmp.less(axis, core.key(cur), core.key(id));
            if descend {
                stack.push((node.right, depth + 1));
            }
        }
    }
    best
}

/// Least element whose key on `axis` is not less than `bound`.
pub(crate) fn mapping_lower_bound<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
    bound: &K,
) -> Option<NodeId> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if !core.cmp.less(axis, core.key(id), bound)
            && best.map_or(true, |b| axis_lt(core, axis, id, b))
        {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.right != HEADER {
            let descend = split != axis
                || best.map_or(true, |b| !core.cmp.less(axis, core.key(b), core.key(id)));
            if descend {
                stack.push((node.right, depth + 1));
            }
        }
        if node.left != HEADER {
            let descend = split != axis
                || match core.flavor {
                    Flavor::Strict => core.cmp.less(axis, bound, core.key(id)),
                    Flavor::Relaxed => !core.cmp.less(axis, core.key(id), bound),
                };
            if descend {
                stack.push((node.left, depth + 1));
            }
        }
    }
    best
}

/// Least element whose key on `axis` is greater than `bound`.
pub(crate) fn mapping_upper_bound<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    axis: usize,
    bound: &K,
) -> Option<NodeId> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut best: Option<NodeId> = None;
    let mut stack: WalkStack = TinyVec::new();
    stack.push((root, 0));
    while let Some((id, depth)) = stack.pop() {
        if core.cmp.less(axis, bound, core.key(id))
            && best.map_or(true, |b| axis_lt(core, axis, id, b))
        {
            best = Some(id);
        }
        let split = core.rank.axis_at(depth);
        let node = core.node(id);
        if node.right != HEADER {
            let descend = split != axis
                || best.map_or(true, |b| !core.cmp.less(axis, core.key(b), core.key(id)));
            if descend {
                stack.push((node.right, depth + 1));
            }
        }
        if node.left != HEADER {
            let descend = split != axis || core.cmp.less(axis, bound, core.key(id));
            if descend {
                stack.push((node.left, depth + 1));
            }
        }
    }
    best
}

/// Ascending traversal along one mapping axis.
///
/// Produced by the trees' `mapping`, `mapping_lower_bound` and
/// `mapping_upper_bound` methods. Double ended; the reverse direction
/// yields the same sequence backwards.
#[derive(Debug, Clone)]
pub struct MappingIter<'a, K, V, R, C> {
    core: &'a Core<K, V, R, C>,
    axis: usize,
    front: Option<NodeId>,
    back: Option<NodeId>,
    done: bool,
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>> MappingIter<'a, K, V, R, C> {
    pub(crate) fn new(core: &'a Core<K, V, R, C>, axis: usize) -> Self {
        let front = mapping_minimum(core, axis);
        Self::with_front(core, axis, front)
    }

    pub(crate) fn with_front(
        core: &'a Core<K, V, R, C>,
        axis: usize,
        front: Option<NodeId>,
    ) -> Self {
        let back = front.is_some().then(|| mapping_maximum(core, axis)).flatten();
        Self {
            core,
            axis,
            front,
            back,
            done: front.is_none(),
        }
    }

    /// The axis this traversal is ordered along.
    pub fn axis(&self) -> usize {
        self.axis
    }
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>> Iterator for MappingIter<'a, K, V, R, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let id = self.front?;
        if self.back == Some(id) {
            self.done = true;
        } else {
            self.front = mapping_successor(self.core, self.axis, id);
        }
        Some(self.core.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.core.len))
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> DoubleEndedIterator for MappingIter<'_, K, V, R, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let id = self.back?;
        if self.front == Some(id) {
            self.done = true;
        } else {
            self.back = mapping_predecessor(self.core, self.axis, id);
        }
        Some(self.core.entry(id))
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> std::iter::FusedIterator for MappingIter<'_, K, V, R, C> {}
