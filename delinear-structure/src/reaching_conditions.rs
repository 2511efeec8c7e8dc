//! Reaching-condition computation (§3 "Reaching conditions", §4.4 step 2).
//!
//! `RC(entry) = true`; for every other reachable block `b`,
//! `RC(b) = OR` over predecessors `p` of `RC(p) AND edge_guard(p -> b)`,
//! skipping any predecessor whose edge to `b` is a back edge (its
//! contribution is re-introduced by the loop wrapper instead, §4.4 step 4).
//! Back edges are exactly the edges that violate reverse-postorder, so
//! processing blocks in RPO guarantees every non-back predecessor's `RC`
//! is already on hand.
//!
//! Computed once per function and memoized in `ReachingConditions`
//! (SPEC_FULL §11.1) rather than recomputed by every later pass that reads
//! a block's guard -- refinement passes and tests can inspect any block's
//! RC directly instead of only seeing it baked into the final `if`.

use rustc_hash::FxHashMap;

use delinear_ast::{AstBuilder, Expr, ProvenanceMap};
use delinear_ir::{Block, Function, IrEntity};

use crate::cfg::ControlFlowGraph;
use crate::dominator_tree::DominatorTree;
use crate::edges::outgoing_edges;
use crate::expr_visitor::ExprVisitor;

pub struct ReachingConditions {
    rc: FxHashMap<Block, Expr>,
}

impl ReachingConditions {
    pub fn compute(
        func: &Function,
        cfg: &ControlFlowGraph,
        dom: &DominatorTree,
        visitor: &mut ExprVisitor<'_>,
        builder: &AstBuilder,
        prov: &mut ProvenanceMap,
    ) -> Self {
        let mut rc: FxHashMap<Block, Expr> = FxHashMap::default();
        let entry = dom.entry_block();
        rc.insert(entry, builder.create_bool_lit(true));

        for b in dom.reverse_postorder() {
            if b == entry {
                continue;
            }
            let mut disjuncts: Vec<Expr> = Vec::new();
            for &p in cfg.predecessors(b) {
                // Back edge: `b` dominates `p`, so this predecessor's
                // contribution is re-introduced by the loop wrapper
                // instead of folded into the acyclic `RC(b)` here.
                if dom.dominates(b, p) {
                    continue;
                }
                let Some(rc_p) = rc.get(&p).cloned() else {
                    // `p` is unreachable, or a forward reference RPO
                    // should have ruled out; either way it contributes no
                    // reaching condition.
                    continue;
                };
                let term = func.dfg.terminator(p).expect("every reachable block has a terminator");
                for edge in outgoing_edges(term, visitor, builder, prov) {
                    if edge.target != b {
                        continue;
                    }
                    disjuncts.push(and_rc(&rc_p, &edge.guard, b, builder, prov));
                }
            }
            let combined = or_all(disjuncts, builder, b, prov);
            rc.insert(b, combined);
        }

        Self { rc }
    }

    pub fn get(&self, block: Block) -> Expr {
        self.rc.get(&block).cloned().expect("RC computed for every reachable block")
    }
}

/// `rc_p && guard`, skipping the conjunction entirely when `rc_p` is the
/// literal `true` (the common case: most blocks' only predecessor chain
/// runs straight back to the entry). The combined node gets no single IR
/// counterpart, so its provenance is tagged with the block it reaches --
/// `RC(b)` fundamentally means "control reaches `b`".
fn and_rc(rc_p: &Expr, guard: &Expr, b: Block, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Expr {
    if rc_p.is_true_literal() {
        return guard.clone();
    }
    if guard.is_true_literal() {
        return rc_p.clone();
    }
    let conj = builder.create_land(rc_p.clone(), guard.clone());
    prov.set(conj.id, IrEntity::Block(b));
    conj
}

fn or_all(mut disjuncts: Vec<Expr>, builder: &AstBuilder, b: Block, prov: &mut ProvenanceMap) -> Expr {
    if disjuncts.is_empty() {
        // No forward-reachable predecessor found for a reachable block:
        // it's reached exclusively via back edges (a loop header entered
        // only through itself), so the initial entry into it is the loop
        // wrapper's own guard; the acyclic skeleton sees it as unconditional.
        return builder.create_bool_lit(true);
    }
    let mut combined = disjuncts.remove(0);
    for d in disjuncts {
        combined = builder.create_lor(combined, d);
        prov.set(combined.id, IrEntity::Block(b));
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use delinear_ast::{AstBuilder, ExprKind};
    use delinear_ir::{Function, Signature, Terminator};

    fn make_diamond() -> Function {
        let mut f = Function::new("diamond", Signature { params: vec![], returns: vec![] });
        let blocks: Vec<Block> = (0..4)
            .map(|i| {
                let b = Block::new(i);
                f.layout.append_block(b);
                b
            })
            .collect();
        let (b0, b1, b2, b3) = (blocks[0], blocks[1], blocks[2], blocks[3]);
        let guard = f.dfg.make_argument(0, delinear_ir::Type::Bool);
        f.dfg.set_terminator(
            b0,
            Terminator::Branch { guard, then_block: b1, then_args: vec![], else_block: b2, else_args: vec![] },
        );
        f.dfg.set_terminator(b1, Terminator::Jump { target: b3, args: vec![] });
        f.dfg.set_terminator(b2, Terminator::Jump { target: b3, args: vec![] });
        f.dfg.set_terminator(b3, Terminator::Return(vec![]));
        f
    }

    #[test]
    fn entry_rc_is_true_join_is_disjunction() {
        let f = make_diamond();
        let cfg = ControlFlowGraph::compute(&f);
        let dom = DominatorTree::compute(&f, &cfg);
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut visitor = ExprVisitor::new(&f, &builder);

        let blocks = f.layout.block_order();
        let (b0, b3) = (blocks[0], blocks[3]);
        let rc = ReachingConditions::compute(&f, &cfg, &dom, &mut visitor, &builder, &mut prov);

        assert!(rc.get(b0).is_true_literal());
        assert!(matches!(rc.get(b3).kind, ExprKind::Binary { op: delinear_ast::BinOp::LOr, .. }));
    }
}
