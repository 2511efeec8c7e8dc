//! The dominator tree: immediate dominators and dominance queries.
//!
//! Computed with the standard iterative reverse-postorder fixpoint (Cooper,
//! Harvey & Kennedy): number blocks by reverse postorder, then repeatedly
//! recompute each block's immediate dominator as the common ancestor of its
//! already-processed predecessors, until nothing changes. Converges in a
//! handful of passes even on CFGs with irreducible loops.

use cranelift_entity::SecondaryMap;
use delinear_ir::{Block, Function};
use rustc_hash::FxHashSet;

use crate::cfg::ControlFlowGraph;

#[derive(Clone, Copy, Default)]
struct DomNode {
    rpo_number: u32,
    idom: Option<Block>,
}

pub struct DominatorTree {
    nodes: SecondaryMap<Block, DomNode>,
    postorder: Vec<Block>,
    entry: Block,
}

impl DominatorTree {
    pub fn compute(func: &Function, cfg: &ControlFlowGraph) -> Self {
        let entry = func.layout.entry_block();
        let postorder = compute_postorder(entry, cfg);

        let mut nodes: SecondaryMap<Block, DomNode> = SecondaryMap::new();
        for (i, &block) in postorder.iter().enumerate() {
            nodes[block].rpo_number = i as u32 + 1;
        }

        let rpo: Vec<Block> = postorder.iter().rev().copied().collect();
        nodes[entry].idom = Some(entry);

        let mut changed = true;
        while changed {
            changed = false;
            for &block in &rpo {
                if block == entry {
                    continue;
                }
                let mut new_idom: Option<Block> = None;
                for &pred in cfg.predecessors(block) {
                    if nodes[pred].rpo_number == 0 {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(cur) => intersect(&nodes, cur, pred),
                    });
                }
                if nodes[block].idom != new_idom {
                    nodes[block].idom = new_idom;
                    changed = true;
                }
            }
        }
        nodes[entry].idom = None;

        Self { nodes, postorder, entry }
    }

    pub fn is_reachable(&self, block: Block) -> bool {
        self.nodes[block].rpo_number != 0
    }

    /// Returns `None` for the entry block and for unreachable blocks.
    pub fn idom(&self, block: Block) -> Option<Block> {
        self.nodes[block].idom
    }

    pub fn entry_block(&self) -> Block {
        self.entry
    }

    /// `true` if `a` dominates `b`, including the case `a == b`.
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        if !self.is_reachable(b) {
            return false;
        }
        let mut cur = b;
        loop {
            if cur == a {
                return true;
            }
            match self.idom(cur) {
                Some(next) => cur = next,
                None => return cur == a,
            }
        }
    }

    /// Blocks in reverse postorder, suitable for a structuralizer that wants
    /// to process a function's regions outside-in.
    pub fn reverse_postorder(&self) -> impl Iterator<Item = Block> + '_ {
        self.postorder.iter().rev().copied()
    }

    /// The direct children of `block` in the dominator tree, i.e. the blocks
    /// whose immediate dominator is `block`.
    pub fn children(&self, block: Block) -> Vec<Block> {
        self.postorder
            .iter()
            .rev()
            .filter(|&&b| b != block && self.idom(b) == Some(block))
            .copied()
            .collect()
    }
}

fn intersect(nodes: &SecondaryMap<Block, DomNode>, mut a: Block, mut b: Block) -> Block {
    while a != b {
        while nodes[a].rpo_number > nodes[b].rpo_number {
            a = nodes[a].idom.expect("reached root without matching");
        }
        while nodes[b].rpo_number > nodes[a].rpo_number {
            b = nodes[b].idom.expect("reached root without matching");
        }
    }
    a
}

fn compute_postorder(entry: Block, cfg: &ControlFlowGraph) -> Vec<Block> {
    let mut postorder = Vec::new();
    let mut visited: FxHashSet<Block> = FxHashSet::default();
    let mut stack: Vec<(Block, usize)> = vec![(entry, 0)];
    visited.insert(entry);

    while let Some(&mut (block, ref mut next_succ)) = stack.last_mut() {
        let succs = cfg.successors(block);
        if *next_succ < succs.len() {
            let succ = succs[*next_succ];
            *next_succ += 1;
            if visited.insert(succ) {
                stack.push((succ, 0));
            }
        } else {
            postorder.push(block);
            stack.pop();
        }
    }
    postorder
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use delinear_ir::{Function, Signature, Terminator};

    fn make_diamond() -> (Function, ControlFlowGraph) {
        let mut f = Function::new("diamond", Signature { params: vec![], returns: vec![] });
        let blocks: Vec<Block> = (0..4)
            .map(|i| {
                let b = Block::new(i);
                f.layout.append_block(b);
                b
            })
            .collect();
        let (b0, b1, b2, b3) = (blocks[0], blocks[1], blocks[2], blocks[3]);
        f.dfg.set_terminator(
            b0,
            Terminator::Branch { guard: dummy_value(), then_block: b1, then_args: vec![], else_block: b2, else_args: vec![] },
        );
        f.dfg.set_terminator(b1, Terminator::Jump { target: b3, args: vec![] });
        f.dfg.set_terminator(b2, Terminator::Jump { target: b3, args: vec![] });
        f.dfg.set_terminator(b3, Terminator::Return(vec![]));
        let cfg = ControlFlowGraph::compute(&f);
        (f, cfg)
    }

    fn dummy_value() -> delinear_ir::Value {
        delinear_ir::Value::new(0)
    }

    #[test]
    fn diamond_join_dominated_by_entry() {
        let (f, cfg) = make_diamond();
        let dom = DominatorTree::compute(&f, &cfg);
        let blocks = f.layout.block_order();
        let (b0, b1, b2, b3) = (blocks[0], blocks[1], blocks[2], blocks[3]);

        assert_eq!(dom.idom(b1), Some(b0));
        assert_eq!(dom.idom(b2), Some(b0));
        assert_eq!(dom.idom(b3), Some(b0));
        assert_eq!(dom.idom(b0), None);
        assert!(dom.dominates(b0, b3));
        assert!(!dom.dominates(b1, b3));
        assert!(!dom.dominates(b2, b1));
    }

    #[test]
    fn unreachable_block_has_no_idom() {
        let mut f = Function::new("t", Signature { params: vec![], returns: vec![] });
        let b0 = Block::new(0);
        let b1 = Block::new(1);
        f.layout.append_block(b0);
        f.layout.append_block(b1);
        f.dfg.set_terminator(b0, Terminator::Return(vec![]));
        f.dfg.set_terminator(b1, Terminator::Return(vec![]));
        let cfg = ControlFlowGraph::compute(&f);
        let dom = DominatorTree::compute(&f, &cfg);
        assert!(!dom.is_reachable(b1));
        assert_eq!(dom.idom(b1), None);
    }
}
