//! Stable, monotonically-increasing node identifiers.
//!
//! Provenance is keyed on these rather than on tree position or a
//! back-pointer from child to parent: a side-map keyed by stable node ids
//! never creates cycles the way a back-pointer would.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Hands out fresh [`NodeId`]s for one run of the pipeline. Owned by
/// [`crate::builder::AstBuilder`]; never reset mid-run so ids stay unique
/// even across passes that delete and replace subtrees.
#[derive(Default)]
pub struct NodeIdGen {
    next: AtomicU32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self { next: AtomicU32::new(0) }
    }

    pub fn fresh(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
impl NodeId {
    pub(crate) fn default_for_test(n: u32) -> Self {
        NodeId(n)
    }
}
