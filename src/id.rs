//! Plan node identity allocation.

use std::cell::Cell;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanNodeId(pub i32);

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-query, monotonically increasing. Rewrites always allocate a fresh id
/// for a replacement node rather than reuse the id of the node they replace:
/// nothing downstream asserts ids are stable across a rewrite, and reusing
/// them would make it easy to accidentally alias two structurally different
/// nodes.
#[derive(Debug, Default)]
pub struct PlanNodeIdAllocator {
    next: Cell<i32>,
}

impl PlanNodeIdAllocator {
    pub fn new() -> Self {
        PlanNodeIdAllocator { next: Cell::new(0) }
    }

    pub fn next_id(&self) -> PlanNodeId {
        let id = self.next.get();
        self.next.set(id + 1);
        PlanNodeId(id)
    }
}
