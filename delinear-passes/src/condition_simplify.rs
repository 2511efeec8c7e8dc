//! The condition-simplifier pseudo-pass (§4.8 phases 2 and 4): walks every
//! `if`/`while` condition in the AST and replaces it with `ctx.simplifier`'s
//! `Simplify(expr)`.
//!
//! Unlike the other passes, this one is intentionally *not* parameterized
//! by which SMT tactic pipeline it runs -- the Pass Manager hands it a
//! different `ConditionSimplifier` instance per phase (CBR tactics in the
//! CBR fixpoint, Final tactics in the final phase), so the same pass type
//! serves both roles in §4.8's phase list (`condition-simplifier` and
//! `final-condition-simplifier`).

use delinear_ast::{Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct ConditionSimplify;

impl Pass for ConditionSimplify {
    fn name(&self) -> &'static str {
        "condition-simplifier"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        simplify(body, ctx)
    }
}

fn simplify(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::If { cond, then_branch, else_branch } => {
            let simplified = ctx.simplifier.simplify(cond, ctx.builder, ctx.prov);
            if simplified.id != cond.id {
                ctx.prov.copy_provenance(cond.id, simplified.id);
                *cond = simplified;
                changed = true;
            }
            changed |= simplify(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= simplify(e, ctx);
            }
        }
        StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => {
            let simplified = ctx.simplifier.simplify(cond, ctx.builder, ctx.prov);
            if simplified.id != cond.id {
                ctx.prov.copy_provenance(cond.id, simplified.id);
                *cond = simplified;
                changed = true;
            }
            changed |= simplify(body, ctx);
        }
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= simplify(s, ctx);
            }
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, ExprKind, ProvenanceMap};
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    #[test]
    fn double_negation_simplifies_under_if() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(2000);

        let a = builder.create_var("a", Type::Bool);
        let not_not_a = builder.create_lnot(builder.create_lnot(a));
        let s = builder.create_expr_stmt(builder.create_call("s", Type::Void, vec![]));
        let mut if_stmt = builder.create_if(not_not_a, s, None);

        let mut pass = ConditionSimplify;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        pass.run(&mut if_stmt, &mut c);

        let StmtKind::If { cond, .. } = &if_stmt.kind else { panic!("expected if") };
        assert!(matches!(&cond.kind, ExprKind::Var(name) if name == "a"));
    }
}
