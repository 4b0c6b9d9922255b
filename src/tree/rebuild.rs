//! Median-split subtree rebuilding.
//!
//! Rebuilds relink the nodes that are already in the arena; no element moves
//! between slots, so handles and tie-break order survive. The work list is
//! an explicit stack, keeping rebuild usable on degenerate trees too deep
//! for recursion.

use std::cmp::Ordering;

use tinyvec::TinyVec;

use crate::compare::AxisCompare;
use crate::node::{NodeId, HEADER};
use crate::rank::Rank;

use super::core::{Core, Flavor};

/// Which link of the parent a freshly built subtree hangs on.
#[derive(Clone, Copy, Default)]
enum Hang {
    Left,
    Right,
    #[default]
    Detached,
}

#[derive(Clone, Copy, Default)]
struct Frame {
    lo: usize,
    hi: usize,
    depth: usize,
    parent: NodeId,
    hang: Hang,
}

impl<K, V, R: Rank, C: AxisCompare<K>> Core<K, V, R, C> {
    /// Ids of the subtree rooted at `root`, in no particular order.
    pub(crate) fn collect_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack: TinyVec<[NodeId; 32]> = TinyVec::new();
        stack.push(root);
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

    /// Relink the subtree rooted at `root` into median-split form.
    pub(crate) fn rebuild_subtree(&mut self, root: NodeId, root_depth: usize) {
        let parent = self.node(root).parent;
        let mut ids = self.collect_subtree(root);
        let new_root = self.build_ids(&mut ids, root_depth, parent);
        self.replace_child(parent, root, new_root);
        self.refresh_extremes();
    }

    /// Link `ids` into a median-split subtree and return its root. The
    /// nodes' parent links are set here; the returned root still has to be
    /// hung on `parent` by the caller.
    pub(crate) fn build_ids(
        &mut self,
        ids: &mut [NodeId],
        depth: usize,
        parent: NodeId,
    ) -> NodeId {
        if ids.is_empty() {
            return HEADER;
        }
        let mut new_root = HEADER;
        let mut stack: TinyVec<[Frame; 32]> = TinyVec::new();
        stack.push(Frame {
            lo: 0,
            hi: ids.len(),
            depth,
            parent,
            hang: Hang::Detached,
        });
        while let Some(frame) = stack.pop() {
            let Frame {
                lo,
                hi,
                depth,
                parent,
                hang,
            } = frame;
            let axis = self.rank.axis_at(depth);
            let range = &mut ids[lo..hi];
            let mid = range.len() / 2;
            range.select_nth_unstable_by(mid, |&a, &b| {
                if self.cmp.less(axis, self.key(a), self.key(b)) {
                    Ordering::Less
                } else if self.cmp.less(axis, self.key(b), self.key(a)) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            });
            let pivot_at = match self.flavor {
                Flavor::Relaxed => mid,
                Flavor::Strict => {
                    // Keep duplicates of the pivot out of the left range by
                    // promoting the first of the equal run.
                    let mut lt_end = 0;
                    for i in 0..mid {
                        if self.cmp.less(axis, self.key(range[i]), self.key(range[mid])) {
                            range.swap(i, lt_end);
                            lt_end += 1;
                        }
                    }
                    range.swap(lt_end, mid);
                    lt_end
                }
            };
            let pivot = range[pivot_at];
            {
                let n = self.node_mut(pivot);
                n.parent = parent;
                n.left = HEADER;
                n.right = HEADER;
                n.weight = (hi - lo) as u32;
            }
            match hang {
                Hang::Left => self.node_mut(parent).left = pivot,
                Hang::Right => self.node_mut(parent).right = pivot,
                Hang::Detached => new_root = pivot,
            }
            let pivot_abs = lo + pivot_at;
            if pivot_abs > lo {
                stack.push(Frame {
                    lo,
                    hi: pivot_abs,
                    depth: depth + 1,
                    parent: pivot,
                    hang: Hang::Left,
                });
            }
            if pivot_abs + 1 < hi {
                stack.push(Frame {
                    lo: pivot_abs + 1,
                    hi,
                    depth: depth + 1,
                    parent: pivot,
                    hang: Hang::Right,
                });
            }
        }
        new_root
    }

    /// Build a balanced tree out of `elems` in one pass. The tree must be
    /// empty.
    pub(crate) fn bulk_build(&mut self, elems: Vec<(K, V)>) {
        debug_assert_eq!(self.len, 0);
        let mut ids: Vec<NodeId> = elems
            .into_iter()
            .map(|(key, value)| self.alloc(key, value))
            .collect();
        let count = ids.len();
        let root = self.build_ids(&mut ids, 0, HEADER);
        self.node_mut(HEADER).parent = root;
        self.len = count;
        self.refresh_extremes();
    }
}
