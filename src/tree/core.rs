//! State and structural operations shared by both tree variants.

use tinyvec::TinyVec;

use crate::compare::AxisCompare;
use crate::error::Result;
use crate::node::{Node, NodeId, Position, HEADER};
use crate::rank::Rank;

/// Which partition invariant the hosting tree maintains.
///
/// Strict trees forbid keys equal on the split axis in left subtrees;
/// relaxed trees permit them on either side. Iterator pruning consults this
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flavor {
    Strict,
    Relaxed,
}

/// Inline stack for tree walks; spills to the heap past 32 levels.
pub(crate) type WalkStack = TinyVec<[(NodeId, usize); 32]>;

#[derive(Debug, Clone)]
pub(crate) struct Core<K, V, R, C> {
    pub(crate) nodes: Vec<Node<K, V>>,
    pub(crate) free: Vec<NodeId>,
    pub(crate) rank: R,
    pub(crate) cmp: C,
    pub(crate) flavor: Flavor,
    pub(crate) len: usize,
}

impl<K, V, R: Rank, C: AxisCompare<K>> Core<K, V, R, C> {
    pub(crate) fn new(rank: R, cmp: C, flavor: Flavor) -> Self {
        debug_assert!(rank.dimensions() > 0, "rank must be at least 1");
        Self {
            nodes: vec![Node::header()],
            free: Vec::new(),
            rank,
            cmp,
            flavor,
            len: 0,
        }
    }

    // Accessors.

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.idx()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.idx()]
    }

    /// Key of a non-header node.
    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> &K {
        &self.node(id).entry.as_ref().unwrap().0
    }

    #[inline]
    pub(crate) fn entry(&self, id: NodeId) -> (&K, &V) {
        let (key, value) = self.node(id).entry.as_ref().unwrap();
        (key, value)
    }

    #[inline]
    pub(crate) fn root(&self) -> NodeId {
        self.node(HEADER).parent
    }

    #[inline]
    pub(crate) fn leftmost(&self) -> NodeId {
        self.node(HEADER).left
    }

    #[inline]
    pub(crate) fn rightmost(&self) -> NodeId {
        self.node(HEADER).right
    }

    #[inline]
    pub(crate) fn dimensions(&self) -> usize {
        self.rank.dimensions()
    }

    // Slot management.

    /// Take a slot for a fresh node. Links are null, weight 1.
    pub(crate) fn alloc(&mut self, key: K, value: V) -> NodeId {
        if let Some(id) = self.free.pop() {
            let generation = self.nodes[id.idx()].generation;
            self.nodes[id.idx()] = Node {
                generation,
                ..Node::new(key, value)
            };
            id
        } else {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(Node::new(key, value));
            id
        }
    }

    /// Make sure the next `alloc` cannot grow the slot vector.
    pub(crate) fn try_reserve_node(&mut self) -> Result<()> {
        if self.free.is_empty() {
            self.nodes.try_reserve(1)?;
        }
        Ok(())
    }

    /// Return an unlinked node's slot to the free list.
    pub(crate) fn release(&mut self, id: NodeId) -> (K, V) {
        let node = &mut self.nodes[id.idx()];
        let entry = node.entry.take().unwrap();
        node.generation = node.generation.wrapping_add(1);
        self.free.push(id);
        entry
    }

    #[inline]
    pub(crate) fn position(&self, id: NodeId) -> Position {
        Position {
            node: id,
            generation: self.node(id).generation,
        }
    }

    /// Validate a public handle against its slot's generation stamp.
    pub(crate) fn resolve(&self, pos: Position) -> Option<NodeId> {
        let node = self.nodes.get(pos.node.idx())?;
        (pos.node != HEADER && node.entry.is_some() && node.generation == pos.generation)
            .then_some(pos.node)
    }

    pub(crate) fn clear(&mut self) {
        for idx in 1..self.nodes.len() {
            let node = &mut self.nodes[idx];
            if node.entry.take().is_some() {
                node.generation = node.generation.wrapping_add(1);
                self.free.push(NodeId(idx as u32));
            }
        }
        let header = self.node_mut(HEADER);
        header.parent = HEADER;
        header.left = HEADER;
        header.right = HEADER;
        self.len = 0;
    }

    // Geometric in-order navigation. The order is structural, not sorted;
    // it exists so that full traversal is iterator-local through the parent
    // links.

    pub(crate) fn minimum_of(&self, mut id: NodeId) -> NodeId {
        while self.node(id).left != HEADER {
            id = self.node(id).left;
        }
        id
    }

    pub(crate) fn maximum_of(&self, mut id: NodeId) -> NodeId {
        while self.node(id).right != HEADER {
            id = self.node(id).right;
        }
        id
    }

    /// In-order successor; the header when `id` is the rightmost node.
    pub(crate) fn successor(&self, id: NodeId) -> NodeId {
        let right = self.node(id).right;
        if right != HEADER {
            return self.minimum_of(right);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != HEADER && self.node(parent).right == child {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    /// In-order predecessor; the header when `id` is the leftmost node.
    pub(crate) fn predecessor(&self, id: NodeId) -> NodeId {
        let left = self.node(id).left;
        if left != HEADER {
            return self.maximum_of(left);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != HEADER && self.node(parent).left == child {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    pub(crate) fn depth_of(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.node(id).parent;
        while cur != HEADER {
            depth += 1;
            cur = self.node(cur).parent;
        }
        depth
    }

    /// Ancestors of `id` from the root down, `id` included.
    pub(crate) fn path_from_root(&self, id: NodeId) -> TinyVec<[NodeId; 32]> {
        let mut path: TinyVec<[NodeId; 32]> = TinyVec::new();
        let mut cur = id;
        while cur != HEADER {
            path.push(cur);
            cur = self.node(cur).parent;
        }
        path.reverse();
        path
    }

    /// Recompute the header's leftmost/rightmost caches from the root.
    pub(crate) fn refresh_extremes(&mut self) {
        let root = self.root();
        let (leftmost, rightmost) = if root == HEADER {
            (HEADER, HEADER)
        } else {
            (self.minimum_of(root), self.maximum_of(root))
        };
        let header = self.node_mut(HEADER);
        header.left = leftmost;
        header.right = rightmost;
    }

    // Axis extremes, used to pick erase candidates. Minimum and maximum are
    // total under (key on `target`, node id), which keeps candidate choice
    // deterministic in the presence of duplicates.

    /// Node of the subtree at `root` with the least key along `target`.
    pub(crate) fn axis_minimum(
        &self,
        root: NodeId,
        root_depth: usize,
        target: usize,
    ) -> (NodeId, usize) {
        debug_assert_ne!(root, HEADER);
        let mut best: Option<(NodeId, usize)> = None;
        let mut stack: WalkStack = TinyVec::new();
        stack.push((root, root_depth));
        while let Some((id, depth)) = stack.pop() {
            let improves = match best {
                None => true,
                Some((b, _)) => {
                    self.cmp.less(target, self.key(id), self.key(b))
                        || (!self.cmp.less(target, self.key(b), self.key(id)) && id < b)
                }
            };
            if improves {
                best = Some((id, depth));
            }
            let split = self.rank.axis_at(depth);
            let node = self.node(id);
            if node.right != HEADER {
                // The right subtree holds keys not less than this node on
                // the split axis; when that is the target axis it can only
                // matter if this node ties the minimum.
                let (b, _) = best.unwrap();
                if split != target || !self.cmp.less(target, self.key(b), self.key(id)) {
                    stack.push((node.right, depth + 1));
                }
            }
            if node.left != HEADER {
                stack.push((node.left, depth + 1));
            }
        }
        best.unwrap()
    }

    /// Node of the subtree at `root` with the greatest key along `target`.
    pub(crate) fn axis_maximum(
        &self,
        root: NodeId,
        root_depth: usize,
        target: usize,
    ) -> (NodeId, usize) {
        debug_assert_ne!(root, HEADER);
        let mut best: Option<(NodeId, usize)> = None;
        let mut stack: WalkStack = TinyVec::new();
        stack.push((root, root_depth));
        while let Some((id, depth)) = stack.pop() {
            let improves = match best {
                None => true,
                Some((b, _)) => {
                    self.cmp.less(target, self.key(b), self.key(id))
                        || (!self.cmp.less(target, self.key(id), self.key(b)) && id > b)
                }
            };
            if improves {
                best = Some((id, depth));
            }
            let split = self.rank.axis_at(depth);
            let node = self.node(id);
            if node.left != HEADER {
                // Left keys never exceed this node on the split axis, so on
                // the target axis the subtree only matters on a tie. A
                // strict tree forbids the tie itself; the strictly-greater
                // test covers both flavors.
                let (b, _) = best.unwrap();
                if split != target || !self.cmp.less(target, self.key(id), self.key(b)) {
                    stack.push((node.left, depth + 1));
                }
            }
            if node.right != HEADER {
                stack.push((node.right, depth + 1));
            }
        }
        best.unwrap()
    }

    // Structural erase.

    /// Redirect the link through which `parent` reaches `old` to `new`.
    /// The header's root link lives in its `parent` field.
    pub(crate) fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let node = self.node_mut(parent);
        if parent == HEADER {
            node.parent = new;
        } else if node.left == old {
            node.left = new;
        } else {
            debug_assert_eq!(node.right, old);
            node.right = new;
        }
    }

    /// Detach `node` from the link structure, repeatedly filling each hole
    /// with the axis extreme of the subtree below it. The slot itself is not
    /// released; the caller owns that step. Subtree weights between each
    /// hole and its filler are kept current; weights above `node` are the
    /// caller's concern.
    ///
    /// Returns every node whose weight changed, with its depth. Together
    /// with the ancestors of `node` these lie on a single root-to-leaf
    /// path, so a balancing pass can scan them in depth order and rebuild
    /// at the topmost offender alone.
    pub(crate) fn remove_from(
        &mut self,
        node: NodeId,
        depth: usize,
    ) -> TinyVec<[(NodeId, usize); 32]> {
        let mut touched: TinyVec<[(NodeId, usize); 32]> = TinyVec::new();
        // Pick the displacement chain first, top down, while the structure
        // is still intact. `hang` records the strict no-right case, where
        // the survivors of a left subtree re-hang on the right of the
        // promoted axis minimum.
        let mut chain: Vec<(NodeId, usize, bool)> = vec![(node, depth, false)];
        loop {
            let &(hole, hole_depth, _) = chain.last().unwrap();
            let (left, right) = {
                let n = self.node(hole);
                (n.left, n.right)
            };
            if left == HEADER && right == HEADER {
                break;
            }
            let axis = self.rank.axis_at(hole_depth);
            let (cand, cand_depth, hang) = if right != HEADER {
                let (c, d) = self.axis_minimum(right, hole_depth + 1, axis);
                (c, d, false)
            } else if self.flavor == Flavor::Strict {
                let (c, d) = self.axis_minimum(left, hole_depth + 1, axis);
                (c, d, true)
            } else {
                let (c, d) = self.axis_maximum(left, hole_depth + 1, axis);
                (c, d, false)
            };
            // Everything strictly between the hole and its filler loses one
            // descendant.
            let mut p = self.node(cand).parent;
            let mut p_depth = cand_depth;
            while p != hole {
                p_depth -= 1;
                self.node_mut(p).weight -= 1;
                touched.push((p, p_depth));
                p = self.node(p).parent;
            }
            chain.push((cand, cand_depth, hang));
        }

        // Unwind bottom up: detach the deepest pick as a leaf, then let each
        // entry take over the hole above it.
        let (mut filler, _, mut filler_hang) = chain.pop().unwrap();
        let leaf_parent = self.node(filler).parent;
        self.replace_child(leaf_parent, filler, HEADER);

        while let Some((hole, hole_depth, hole_hang)) = chain.pop() {
            let (h_parent, h_left, h_right, h_weight) = {
                let h = self.node(hole);
                (h.parent, h.left, h.right, h.weight)
            };
            {
                let f = self.node_mut(filler);
                f.parent = h_parent;
                if filler_hang {
                    f.left = HEADER;
                    f.right = h_left;
                } else {
                    f.left = h_left;
                    f.right = h_right;
                }
                f.weight = h_weight - 1;
            }
            self.replace_child(h_parent, hole, filler);
            let (f_left, f_right) = {
                let f = self.node(filler);
                (f.left, f.right)
            };
            if f_left != HEADER {
                self.node_mut(f_left).parent = filler;
            }
            if f_right != HEADER {
                self.node_mut(f_right).parent = filler;
            }
            touched.push((filler, hole_depth));
            filler = hole;
            filler_hang = hole_hang;
        }
        touched
    }
}

#[cfg(test)]
impl<K, V, R: Rank, C: AxisCompare<K>> Core<K, V, R, C> {
    /// Every occupied slot reachable from the root, any order.
    pub(crate) fn all_ids(&self) -> Vec<NodeId> {
        let root = self.root();
        if root == HEADER {
            return Vec::new();
        }
        let mut ids = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            ids.push(id);
            let n = self.node(id);
            if n.left != HEADER {
                stack.push(n.left);
            }
            if n.right != HEADER {
                stack.push(n.right);
            }
        }
        ids
    }

    pub(crate) fn depth(&self) -> usize {
        let root = self.root();
        if root == HEADER {
            return 0;
        }
        let mut max = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((id, d)) = stack.pop() {
            max = max.max(d);
            let n = self.node(id);
            if n.left != HEADER {
                stack.push((n.left, d + 1));
            }
            if n.right != HEADER {
                stack.push((n.right, d + 1));
            }
        }
        max
    }

    /// Panics unless every structural invariant holds: link symmetry, the
    /// flavor's partition rule at every node, header caches, the element
    /// count, and (on request) subtree weights.
    pub(crate) fn check_invariants(&self, check_weights: bool) {
        let root = self.root();
        if root == HEADER {
            assert_eq!(self.len, 0);
            assert_eq!(self.leftmost(), HEADER);
            assert_eq!(self.rightmost(), HEADER);
            return;
        }
        assert_eq!(self.node(root).parent, HEADER, "root must hang off the header");
        assert_eq!(self.leftmost(), self.minimum_of(root));
        assert_eq!(self.rightmost(), self.maximum_of(root));

        let ids = self.all_ids();
        assert_eq!(ids.len(), self.len, "len must match reachable nodes");

        for &id in &ids {
            let n = self.node(id);
            assert!(n.entry.is_some());
            for child in [n.left, n.right] {
                if child != HEADER {
                    assert_eq!(self.node(child).parent, id, "child/parent link mismatch");
                }
            }
            if check_weights {
                let left_w = if n.left == HEADER { 0 } else { self.node(n.left).weight };
                let right_w = if n.right == HEADER { 0 } else { self.node(n.right).weight };
                assert_eq!(n.weight, 1 + left_w + right_w, "weight must count the subtree");
            }

            let depth = self.depth_of(id);
            let axis = self.rank.axis_at(depth);
            let mut sub = Vec::new();
            if n.left != HEADER {
                sub.push((n.left, true));
            }
            if n.right != HEADER {
                sub.push((n.right, false));
            }
            let mut stack: Vec<(NodeId, bool)> = sub;
            while let Some((d, on_left)) = stack.pop() {
                if on_left {
                    match self.flavor {
                        Flavor::Strict => assert!(
                            self.cmp.less(axis, self.key(d), self.key(id)),
                            "strict partition violated on the left"
                        ),
                        Flavor::Relaxed => assert!(
                            !self.cmp.less(axis, self.key(id), self.key(d)),
                            "relaxed partition violated on the left"
                        ),
                    }
                } else {
                    assert!(
                        !self.cmp.less(axis, self.key(d), self.key(id)),
                        "partition violated on the right"
                    );
                }
                let dn = self.node(d);
                if dn.left != HEADER {
                    stack.push((dn.left, on_left));
                }
                if dn.right != HEADER {
                    stack.push((dn.right, on_left));
                }
            }
        }
    }
}
