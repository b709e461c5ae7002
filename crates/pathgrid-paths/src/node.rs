use std::cmp::Ordering;
use std::collections::BinaryHeap;

use pathgrid_core::Point;

/// Parent index of the root node.
pub(crate) const NO_PARENT: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// SearchNode
// ---------------------------------------------------------------------------

/// A node in the search arena.
///
/// Nodes refer to their parent by arena index, so the whole tree is released
/// at once when the arena is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchNode {
    pub pos: Point,
    /// Accumulated cost from the start.
    pub g: i32,
    /// Heuristic estimate to the goal.
    pub h: i32,
    /// `g + h`.
    pub f: i32,
    pub(crate) parent: u32,
}

impl SearchNode {
    pub(crate) fn root(pos: Point, h: i32) -> Self {
        Self {
            pos,
            g: 0,
            h,
            f: h,
            parent: NO_PARENT,
        }
    }

    /// Whether this node has no parent (the start of the search).
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent == NO_PARENT
    }
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// Reference into the node arena, ordered for the frontier heap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NodeRef {
    pub(crate) idx: u32,
    pub(crate) f: i32,
    /// Insertion counter; lower = pushed earlier.
    seq: u64,
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (max-heap) pops smallest f first, and the
        // earliest push among equal f.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-f priority queue with FIFO tie-breaking.
///
/// Decrease-key is done by pushing a fresh entry; the caller skips entries
/// that no longer match their node when popped.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<NodeRef>,
    seq: u64,
}

impl Frontier {
    pub(crate) fn push(&mut self, idx: u32, f: i32) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(NodeRef { idx, f, seq });
    }

    pub(crate) fn pop(&mut self) -> Option<NodeRef> {
        self.heap.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn clear(&mut self) {
        self.heap = BinaryHeap::new();
    }
}
