//! Natural-loop discovery (§4.4 step 4, GLOSSARY "Natural loop").
//!
//! A back edge is a CFG edge `(p, h)` where `h` dominates `p`. Its natural
//! loop is `h` plus every block that can reach `p` without passing through
//! `h`, found by walking predecessors backwards from `p`. Two back edges
//! sharing a header contribute to the same loop (their bodies are unioned)
//! rather than being treated as distinct loops -- this core assumes
//! reducible CFGs (§1 Non-goals), so a header never has more than one
//! genuinely distinct natural loop.

use rustc_hash::{FxHashMap, FxHashSet};

use delinear_ir::Block;

use crate::cfg::ControlFlowGraph;
use crate::dominator_tree::DominatorTree;

#[derive(Default)]
pub struct LoopForest {
    /// Every loop header, mapped to the full set of blocks in its natural
    /// loop (including the header itself).
    members: FxHashMap<Block, FxHashSet<Block>>,
}

impl LoopForest {
    pub fn compute(cfg: &ControlFlowGraph, dom: &DominatorTree, blocks: &[Block]) -> Self {
        let mut members: FxHashMap<Block, FxHashSet<Block>> = FxHashMap::default();
        for &p in blocks {
            for &h in cfg.successors(p) {
                if dom.is_reachable(h) && dom.dominates(h, p) {
                    let body = members.entry(h).or_default();
                    body.insert(h);
                    collect_natural_loop_body(p, h, cfg, body);
                }
            }
        }
        Self { members }
    }

    pub fn is_header(&self, block: Block) -> bool {
        self.members.contains_key(&block)
    }

    /// The loops (by header) that contain `block`, including `block`'s own
    /// loop if `block` is itself a header.
    fn containing(&self, block: Block) -> impl Iterator<Item = Block> + '_ {
        self.members
            .iter()
            .filter(move |(_, body)| body.contains(&block))
            .map(|(&h, _)| h)
    }

    /// The loop scope `block` is emitted into: the innermost loop strictly
    /// containing it, skipping `block`'s own loop when `block` is itself a
    /// header (a header belongs to its *parent* scope; its own body is a
    /// nested scope built separately). `None` means function top level.
    pub fn enclosing_scope(&self, block: Block) -> Option<Block> {
        self.containing(block)
            .filter(|&h| h != block)
            .min_by_key(|h| self.members[h].len())
    }

    /// All blocks whose `enclosing_scope` is exactly `scope`, i.e. the
    /// blocks directly emitted into that region (function top level when
    /// `scope` is `None`, or one loop header's body).
    pub fn blocks_in_scope(&self, scope: Option<Block>, candidates: &[Block]) -> Vec<Block> {
        candidates.iter().copied().filter(|&b| self.enclosing_scope(b) == scope).collect()
    }

    /// Whether `target` is a member of `header`'s natural loop -- used to
    /// decide whether an outgoing edge from inside the loop is a
    /// loop-continue (falls through / back edge) or a loop-exit (`break`).
    pub fn loop_contains(&self, header: Block, target: Block) -> bool {
        self.members.get(&header).is_some_and(|body| body.contains(&target))
    }
}

/// Walks predecessors backwards from `p`, collecting every block that can
/// reach `p` without going through `h`, into `body`.
fn collect_natural_loop_body(p: Block, h: Block, cfg: &ControlFlowGraph, body: &mut FxHashSet<Block>) {
    let mut stack = vec![p];
    while let Some(b) = stack.pop() {
        if !body.insert(b) {
            continue;
        }
        if b == h {
            continue;
        }
        for &pred in cfg.predecessors(b) {
            if !body.contains(&pred) {
                stack.push(pred);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use delinear_ir::{Function, Signature, Terminator};

    /// `b0 -> b1 -> b2 -> b1` (back edge), `b2 -> b3` (exit).
    fn make_loop() -> (Function, ControlFlowGraph, DominatorTree) {
        let mut f = Function::new("loop", Signature { params: vec![], returns: vec![] });
        let blocks: Vec<Block> = (0..4)
            .map(|i| {
                let b = Block::new(i);
                f.layout.append_block(b);
                b
            })
            .collect();
        let (b0, b1, b2, b3) = (blocks[0], blocks[1], blocks[2], blocks[3]);
        f.dfg.set_terminator(b0, Terminator::Jump { target: b1, args: vec![] });
        f.dfg.set_terminator(
            b1,
            Terminator::Branch { guard: dummy(), then_block: b2, then_args: vec![], else_block: b3, else_args: vec![] },
        );
        f.dfg.set_terminator(b2, Terminator::Jump { target: b1, args: vec![] });
        f.dfg.set_terminator(b3, Terminator::Return(vec![]));
        let cfg = ControlFlowGraph::compute(&f);
        let dom = DominatorTree::compute(&f, &cfg);
        (f, cfg, dom)
    }

    fn dummy() -> delinear_ir::Value {
        delinear_ir::Value::new(0)
    }

    #[test]
    fn back_edge_forms_natural_loop() {
        let (f, cfg, dom) = make_loop();
        let blocks = f.layout.block_order().to_vec();
        let forest = LoopForest::compute(&cfg, &dom, &blocks);
        let (b1, b2, b3) = (blocks[1], blocks[2], blocks[3]);

        assert!(forest.is_header(b1));
        assert!(!forest.is_header(b2));
        assert!(forest.loop_contains(b1, b1));
        assert!(forest.loop_contains(b1, b2));
        assert!(!forest.loop_contains(b1, b3));
        assert_eq!(forest.enclosing_scope(b2), Some(b1));
        assert_eq!(forest.enclosing_scope(b3), None);
    }
}
