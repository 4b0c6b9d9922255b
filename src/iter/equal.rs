//! Pre-order traversal of coordinate-equivalent elements.
//!
//! Walks the nodes whose keys compare equal to a model key on every axis.
//! The enumeration order is the pre-order of the pruned tree (node, then
//! left subtree, then right subtree), which is what a root descent visits
//! first; the reverse direction mirrors the descent.

use crate::compare::{key_equiv, AxisCompare};
use crate::node::{NodeId, HEADER};
use crate::rank::Rank;
use crate::tree::core::{Core, Flavor};

/// May the left subtree of `id` hold keys equal to the model on the split
/// axis. A strict tree keeps equal keys out of left subtrees, so the model
/// must be strictly below the node there.
fn left_ok<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    id: NodeId,
    depth: usize,
) -> bool {
    let axis = core.rank.axis_at(depth);
    match core.flavor {
        Flavor::Strict => core.cmp.less(axis, model, core.key(id)),
        Flavor::Relaxed => !core.cmp.less(axis, core.key(id), model),
    }
}

fn right_ok<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    id: NodeId,
    depth: usize,
) -> bool {
    let axis = core.rank.axis_at(depth);
    !core.cmp.less(axis, model, core.key(id))
}

fn matches<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    id: NodeId,
) -> bool {
    key_equiv(&core.cmp, core.dimensions(), core.key(id), model)
}

/// One pre-order step through the pruned tree.
fn walk_next<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    id: NodeId,
    depth: usize,
) -> Option<(NodeId, usize)> {
    let node = core.node(id);
    if node.left != HEADER && left_ok(core, model, id, depth) {
        return Some((node.left, depth + 1));
    }
    if node.right != HEADER && right_ok(core, model, id, depth) {
        return Some((node.right, depth + 1));
    }
    // Climb until some ancestor still has an unvisited, admissible right
    // subtree.
    let mut child = id;
    let mut child_depth = depth;
    loop {
        let parent = core.node(child).parent;
        if parent == HEADER {
            return None;
        }
        let parent_depth = child_depth - 1;
        let p = core.node(parent);
        if p.left == child && p.right != HEADER && right_ok(core, model, parent, parent_depth) {
            return Some((p.right, parent_depth + 1));
        }
        child = parent;
        child_depth = parent_depth;
    }
}

/// Deepest node on the last admissible descent path: the final node of the
/// pruned pre-order.
fn walk_deep_last<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    mut id: NodeId,
    mut depth: usize,
) -> (NodeId, usize) {
    loop {
        let node = core.node(id);
        if node.right != HEADER && right_ok(core, model, id, depth) {
            id = node.right;
        } else if node.left != HEADER && left_ok(core, model, id, depth) {
            id = node.left;
        } else {
            return (id, depth);
        }
        depth += 1;
    }
}

/// One reverse pre-order step through the pruned tree.
fn walk_prev<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
    id: NodeId,
    depth: usize,
) -> Option<(NodeId, usize)> {
    let parent = core.node(id).parent;
    if parent == HEADER {
        return None;
    }
    let parent_depth = depth - 1;
    let p = core.node(parent);
    if p.right == id && p.left != HEADER && left_ok(core, model, parent, parent_depth) {
        return Some(walk_deep_last(core, model, p.left, parent_depth + 1));
    }
    Some((parent, parent_depth))
}

/// First equivalent node in pre-order.
pub(crate) fn equal_first<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
) -> Option<(NodeId, usize)> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut cur = (root, 0);
    loop {
        if matches(core, model, cur.0) {
            return Some(cur);
        }
        cur = walk_next(core, model, cur.0, cur.1)?;
    }
}

/// Last equivalent node in pre-order.
fn equal_last<K, V, R: Rank, C: AxisCompare<K>>(
    core: &Core<K, V, R, C>,
    model: &K,
) -> Option<(NodeId, usize)> {
    let root = core.root();
    if root == HEADER {
        return None;
    }
    let mut cur = walk_deep_last(core, model, root, 0);
    loop {
        if matches(core, model, cur.0) {
            return Some(cur);
        }
        cur = walk_prev(core, model, cur.0, cur.1)?;
    }
}

/// Pre-order traversal of the elements coordinate-equivalent to a model key.
///
/// Produced by the trees' `equal_range`. The iterator is its own range: it
/// ends after the last equivalent element. Double ended.
#[derive(Debug, Clone)]
pub struct EqualIter<'a, K, V, R, C> {
    core: &'a Core<K, V, R, C>,
    model: &'a K,
    front: Option<(NodeId, usize)>,
    back: Option<(NodeId, usize)>,
    done: bool,
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>> EqualIter<'a, K, V, R, C> {
    pub(crate) fn new(core: &'a Core<K, V, R, C>, model: &'a K) -> Self {
        let front = equal_first(core, model);
        let back = if front.is_some() {
            equal_last(core, model)
        } else {
            None
        };
        Self {
            core,
            model,
            front,
            back,
            done: front.is_none(),
        }
    }

    /// The key being matched.
    pub fn model(&self) -> &K {
        self.model
    }
}

impl<'a, K, V, R: Rank, C: AxisCompare<K>> Iterator for EqualIter<'a, K, V, R, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (id, depth) = self.front?;
        if self.back.map(|(b, _)| b) == Some(id) {
            self.done = true;
        } else {
            let mut cur = walk_next(self.core, self.model, id, depth);
            while let Some((n, d)) = cur {
                if matches(self.core, self.model, n) {
                    break;
                }
                cur = walk_next(self.core, self.model, n, d);
            }
            self.front = cur;
        }
        Some(self.core.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.core.len))
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> DoubleEndedIterator for EqualIter<'_, K, V, R, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (id, depth) = self.back?;
        if self.front.map(|(f, _)| f) == Some(id) {
            self.done = true;
        } else {
            let mut cur = walk_prev(self.core, self.model, id, depth);
            while let Some((n, d)) = cur {
                if matches(self.core, self.model, n) {
                    break;
                }
                cur = walk_prev(self.core, self.model, n, d);
            }
            self.back = cur;
        }
        Some(self.core.entry(id))
    }
}

impl<K, V, R: Rank, C: AxisCompare<K>> std::iter::FusedIterator for EqualIter<'_, K, V, R, C> {}
