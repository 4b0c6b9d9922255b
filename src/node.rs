//! Node storage.
//!
//! Nodes live in a slab-style arena: a `Vec` of slots addressed by 32-bit
//! ids, with freed slots kept on a free list for reuse. Slot 0 is the header
//! sentinel. The header stores no element; its `parent` link is the root,
//! its `left` and `right` links cache the leftmost and rightmost nodes, and
//! as a child link target id 0 doubles as the null pointer.

/// Index of a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct NodeId(pub(crate) u32);

/// The header sentinel, also the null child link.
pub(crate) const HEADER: NodeId = NodeId(0);

impl NodeId {
    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A stable handle to one stored element.
///
/// Returned by `insert` and the `find_position` lookups, and accepted by
/// `get`, `get_mut` and `erase_at`. Erasing the element or clearing the tree
/// invalidates the handle; a stale handle is rejected by its generation
/// stamp and never aliases a newer element. Behavior on generation overflow
/// of a single slot (2³² reuses) is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) node: NodeId,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) parent: NodeId,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    /// Subtree size, self included. Maintained by the relaxed tree only.
    pub(crate) weight: u32,
    pub(crate) generation: u32,
    /// `None` only for the header and free slots.
    pub(crate) entry: Option<(K, V)>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn header() -> Self {
        Self {
            parent: HEADER,
            left: HEADER,
            right: HEADER,
            weight: 0,
            generation: 0,
            entry: None,
        }
    }

    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            parent: HEADER,
            left: HEADER,
            right: HEADER,
            weight: 1,
            generation: 0,
            entry: Some((key, value)),
        }
    }
}
