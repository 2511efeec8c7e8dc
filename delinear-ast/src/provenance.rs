//! The bidirectional AST-node <-> IR-entity map.
//!
//! Two parallel tables: the primary `node -> ir_entity` map, and a
//! `use_provenance` map for sub-expression tracking inside composite boolean
//! guards, where each node of a composite guard remembers which IR
//! comparison or boolean operation it represents.

use delinear_ir::IrEntity;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::node_id::NodeId;

#[derive(Default)]
pub struct ProvenanceMap {
    nodes: FxHashMap<NodeId, IrEntity>,
    use_provenance: FxHashMap<NodeId, IrEntity>,
    /// `if`-condition nodes the structuralizer synthesized from a `switch`
    /// terminator's equality-comparison chain (§4.4 edge cases; §9 open
    /// question (c)). Condition-based refinement's disjoint-cover merging
    /// explicitly excludes these: "not covered by any rule in the source."
    switch_synthesized: FxHashSet<NodeId>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: NodeId, entity: impl Into<IrEntity>) {
        self.nodes.insert(node, entity.into());
    }

    pub fn get(&self, node: NodeId) -> Option<IrEntity> {
        self.nodes.get(&node).copied()
    }

    /// Like [`Self::get`], but callers that require totality (the
    /// structuralizer, right after it hands a node to the builder) call this
    /// instead so a missing entry fails loudly at the point of the bug
    /// rather than silently downstream. Panics only if a node is queried
    /// before it has been registered by its creator -- a programmer error,
    /// not a runtime condition.
    pub fn get_required(&self, node: NodeId) -> IrEntity {
        self.nodes
            .get(&node)
            .copied()
            .unwrap_or_else(|| panic!("provenance missing for {node}: creator did not register it"))
    }

    pub fn set_use(&mut self, node: NodeId, entity: impl Into<IrEntity>) {
        self.use_provenance.insert(node, entity.into());
    }

    pub fn get_use(&self, node: NodeId) -> Option<IrEntity> {
        self.use_provenance.get(&node).copied()
    }

    /// Copies `src`'s provenance (both maps) onto `dst`. Idempotent: calling
    /// it twice for the same pair leaves the map in the same state as
    /// calling it once. Used whenever a pass derives a new node from an
    /// existing one; the new node inherits use-provenance from its source,
    /// and no provenance entry is ever silently dropped.
    pub fn copy_provenance(&mut self, src: NodeId, dst: NodeId) {
        if let Some(e) = self.nodes.get(&src).copied() {
            self.nodes.insert(dst, e);
        }
        if let Some(e) = self.use_provenance.get(&src).copied() {
            self.use_provenance.insert(dst, e);
        }
    }

    /// Drops `node`'s entries. Called by DeadStmtElim on statements it
    /// removes: their provenance entries become eligible for GC but must
    /// never be reused.
    pub fn forget(&mut self, node: NodeId) {
        self.nodes.remove(&node);
        self.use_provenance.remove(&node);
    }

    /// Marks `node` (an `if` condition) as synthesized from a `switch`
    /// terminator, so condition-based refinement skips it.
    pub fn mark_switch_synthesized(&mut self, node: NodeId) {
        self.switch_synthesized.insert(node);
    }

    pub fn is_switch_synthesized(&self, node: NodeId) -> bool {
        self.switch_synthesized.contains(&node)
    }

    /// Checks that every expression node id in `ids` has a registered entry.
    /// Returns the first id missing one, if any.
    pub fn check_totality<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> Result<(), NodeId> {
        for id in ids {
            if !self.nodes.contains_key(id) {
                return Err(*id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use delinear_ir::Value;

    #[test]
    fn copy_is_idempotent() {
        let mut prov = ProvenanceMap::new();
        let src = NodeId::default_for_test(1);
        let dst = NodeId::default_for_test(2);
        prov.set(src, Value::new(0));
        prov.copy_provenance(src, dst);
        let first = prov.get(dst);
        prov.copy_provenance(src, dst);
        assert_eq!(prov.get(dst), first);
    }

    #[test]
    fn get_required_panics_on_missing() {
        let prov = ProvenanceMap::new();
        let node = NodeId::default_for_test(7);
        let result = std::panic::catch_unwind(|| prov.get_required(node));
        assert!(result.is_err());
    }
}
