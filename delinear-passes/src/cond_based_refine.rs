//! Condition-based refinement.
//!
//! `if (C1) A; if (C2) B;` adjacent, with C6 proving `C2 <-> !C1`, becomes
//! `if (C1) A else B;` (scenario S3). Generalizes to any maximal run of
//! adjacent bare `if`s whose guards are pairwise disjoint and together a
//! tautological cover, lowered to an if/else-if/else chain. Ties break
//! leftmost-run-first, and within a run the largest provable run wins
//! before a smaller one is tried.
//!
//! `if`s the structuralizer tagged as synthesized from a `switch`
//! terminator are excluded (§9 open question (c)): they are not covered by
//! any rule here.

use delinear_ast::{Expr, Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct CondBasedRefine;

impl Pass for CondBasedRefine {
    fn name(&self) -> &'static str {
        "cond-based-refine"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        refine(body, ctx)
    }
}

fn refine(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Compound(stmts) => {
            changed |= refine_run(stmts, ctx);
            for s in stmts.iter_mut() {
                changed |= refine(s, ctx);
            }
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            changed |= refine(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= refine(e, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= refine(body, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

fn is_eligible_bare_if(stmt: &Stmt, ctx: &PassContext) -> bool {
    matches!(&stmt.kind, StmtKind::If { cond, else_branch: None, .. } if !ctx.prov.is_switch_synthesized(cond.id))
}

fn refine_run(stmts: &mut Vec<Stmt>, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < stmts.len() {
        let mut j = i;
        while j < stmts.len() && is_eligible_bare_if(&stmts[j], ctx) {
            j += 1;
        }
        let run_len = j - i;
        if run_len >= 2 {
            let mut applied_len = None;
            for k in (2..=run_len).rev() {
                if covers_and_disjoint(&stmts[i..i + k], ctx) {
                    applied_len = Some(k);
                    break;
                }
            }
            if let Some(k) = applied_len {
                collapse_run(stmts, i, k, ctx);
                changed = true;
                continue;
            }
        }
        i += 1;
    }
    changed
}

fn covers_and_disjoint(run: &[Stmt], ctx: &mut PassContext) -> bool {
    let guards: Vec<Expr> = run
        .iter()
        .map(|s| match &s.kind {
            StmtKind::If { cond, .. } => cond.clone(),
            _ => unreachable!("run is pre-filtered to bare ifs"),
        })
        .collect();

    for i in 0..guards.len() {
        for k in (i + 1)..guards.len() {
            let both = ctx.builder.create_land(guards[i].clone(), guards[k].clone());
            let neither = ctx.builder.create_lnot(both);
            if !ctx.simplifier.prove(&neither).is_valid() {
                return false;
            }
        }
    }

    let mut cover = guards[0].clone();
    for g in &guards[1..] {
        cover = ctx.builder.create_lor(cover, g.clone());
    }
    ctx.simplifier.prove(&cover).is_valid()
}

/// Replaces `stmts[i..i+k]` with one `if/else-if/.../else` chain built
/// right-to-left from the run's bodies, leftmost guard outermost.
fn collapse_run(stmts: &mut Vec<Stmt>, i: usize, k: usize, ctx: &mut PassContext) {
    let run: Vec<Stmt> = stmts.splice(i..i + k, std::iter::empty()).collect();
    let mut arms: Vec<(Expr, Stmt)> = run
        .into_iter()
        .map(|s| match s.kind {
            StmtKind::If { cond, then_branch, .. } => (cond, *then_branch),
            _ => unreachable!("run is pre-filtered to bare ifs"),
        })
        .collect();

    // The last arm's guard is implied by "none of the earlier guards held"
    // once the run is a tautological cover; fold it into a plain `else`
    // rather than a redundant trailing `else if`.
    let (_, last_body) = arms.pop().expect("run_len >= 2");
    let mut chain = last_body;
    while let Some((cond, body)) = arms.pop() {
        chain = ctx.builder.create_if(cond, body, Some(chain));
    }
    stmts.insert(i, chain);
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, ProvenanceMap};
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    #[test]
    fn s3_merges_negated_pair() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(3000);

        let a1 = builder.create_var("a", Type::Bool);
        let a2 = builder.create_var("a", Type::Bool);
        let not_a = builder.create_lnot(a2);
        let s1 = builder.create_expr_stmt(builder.create_call("s1", Type::Void, vec![]));
        let s2 = builder.create_expr_stmt(builder.create_call("s2", Type::Void, vec![]));
        let if1 = builder.create_if(a1, s1, None);
        let if2 = builder.create_if(not_a, s2, None);
        let mut body = builder.create_compound_stmt(vec![if1, if2]);

        let mut pass = CondBasedRefine;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut body, &mut c));

        match &body.kind {
            StmtKind::Compound(stmts) => {
                assert_eq!(stmts.len(), 1);
                assert!(matches!(stmts[0].kind, StmtKind::If { else_branch: Some(_), .. }));
            }
            other => panic!("expected single if/else, got {other:?}"),
        }
    }
}
