//! The control-flow graph: predecessors and successors of each block.
//!
//! Built once per function from its terminators, by scanning each block's
//! successor list and recording the reverse edge.

use cranelift_entity::SecondaryMap;
use delinear_ir::{Block, Function};

#[derive(Clone, Default)]
struct CfgNode {
    predecessors: Vec<Block>,
    successors: Vec<Block>,
}

pub struct ControlFlowGraph {
    nodes: SecondaryMap<Block, CfgNode>,
}

impl ControlFlowGraph {
    pub fn compute(func: &Function) -> Self {
        let mut nodes: SecondaryMap<Block, CfgNode> = SecondaryMap::new();
        for &block in func.layout.block_order() {
            let Some(term) = func.dfg.terminator(block) else {
                continue;
            };
            for succ in term.successors() {
                nodes[block].successors.push(succ);
                nodes[succ].predecessors.push(block);
            }
        }
        Self { nodes }
    }

    pub fn successors(&self, block: Block) -> &[Block] {
        &self.nodes[block].successors
    }

    pub fn predecessors(&self, block: Block) -> &[Block] {
        &self.nodes[block].predecessors
    }

    /// A `(pred, succ)` edge is critical when `pred` has more than one
    /// successor and `succ` has more than one predecessor. The
    /// structuralizer splits these internally so each φ-selector assignment
    /// has an unambiguous edge to live on.
    pub fn is_critical_edge(&self, pred: Block, succ: Block) -> bool {
        self.successors(pred).len() > 1 && self.predecessors(succ).len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use delinear_ir::{Function, Signature, Terminator};

    fn block_only_fn(edges: &[(u32, u32)], num_blocks: u32) -> Function {
        let mut f = Function::new("t", Signature { params: vec![], returns: vec![] });
        let blocks: Vec<Block> = (0..num_blocks)
            .map(|_| {
                let b = Block::new(f.layout.block_order().len());
                f.layout.append_block(b);
                b
            })
            .collect();
        for (i, &b) in blocks.iter().enumerate() {
            let outs: Vec<Block> = edges
                .iter()
                .filter(|(from, _)| *from == i as u32)
                .map(|(_, to)| blocks[*to as usize])
                .collect();
            let term = match outs.len() {
                0 => Terminator::Return(vec![]),
                1 => Terminator::Jump { target: outs[0], args: vec![] },
                _ => unreachable!("test helper only supports <=1 successor"),
            };
            f.dfg.set_terminator(b, term);
        }
        f
    }

    #[test]
    fn successors_and_predecessors_agree() {
        let f = block_only_fn(&[(0, 1), (1, 2)], 3);
        let cfg = ControlFlowGraph::compute(&f);
        let b0 = f.layout.block_order()[0];
        let b1 = f.layout.block_order()[1];
        let b2 = f.layout.block_order()[2];
        assert_eq!(cfg.successors(b0), &[b1]);
        assert_eq!(cfg.predecessors(b1), &[b0]);
        assert_eq!(cfg.successors(b1), &[b2]);
        assert!(cfg.predecessors(b2) == [b1]);
    }
}
