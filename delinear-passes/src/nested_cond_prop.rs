//! Nested-condition propagation.
//!
//! Within `if (A) { if (B) { .. } }`, `B` is simplified under the
//! assumption `A` (and symmetrically under `!A` inside the else branch),
//! via the simplifier's `Simplify` called with an `A && B` assumption
//! context -- scenario S4: `if(a){ if(a && b) S; }` -> `if(a){ if(b) S; }`.

use delinear_ast::{Expr, Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct NestedCondProp;

impl Pass for NestedCondProp {
    fn name(&self) -> &'static str {
        "nested-cond-prop"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        propagate(body, None, ctx)
    }
}

/// `assumption`, when present, is a guard known to hold wherever `stmt`
/// executes (the conjunction of every enclosing `if`'s condition, negated
/// for branches taken via an `else`).
fn propagate(stmt: &mut Stmt, assumption: Option<&Expr>, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::If { cond, then_branch, else_branch } => {
            if let Some(a) = assumption {
                let under_assumption = ctx.builder.create_land(a.clone(), cond.clone());
                let simplified = ctx.simplifier.simplify(&under_assumption, ctx.builder, ctx.prov);
                // Only adopt the simplification if it actually dropped the
                // assumed conjunct -- otherwise we'd be replacing `cond`
                // with `A && cond`, which is equivalent but not smaller.
                if is_simpler(&simplified, cond) {
                    ctx.prov.copy_provenance(cond.id, simplified.id);
                    *cond = simplified;
                    changed = true;
                }
            }
            let then_assumption = match assumption {
                Some(a) => ctx.builder.create_land(a.clone(), cond.clone()),
                None => cond.clone(),
            };
            changed |= propagate(then_branch, Some(&then_assumption), ctx);
            if let Some(e) = else_branch {
                let not_cond = ctx.builder.create_lnot(cond.clone());
                ctx.prov.copy_provenance(cond.id, not_cond.id);
                let else_assumption = match assumption {
                    Some(a) => ctx.builder.create_land(a.clone(), not_cond),
                    None => not_cond,
                };
                changed |= propagate(e, Some(&else_assumption), ctx);
            }
        }
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= propagate(s, assumption, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            // The loop condition is not a sound assumption for the body in
            // `do`/`while(true)`-wrapped loops (it may be re-evaluated
            // after the body mutates its operands), so no assumption
            // carries into a loop body here.
            changed |= propagate(body, None, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

/// A cheap syntactic proxy for "got smaller": true when `simplified` is not
/// itself the literal conjunction we fed in (`assumption && cond`). Avoids
/// a second SMT round-trip just to compare sizes.
fn is_simpler(simplified: &Expr, original_cond: &Expr) -> bool {
    use delinear_ast::{BinOp, ExprKind};
    match &simplified.kind {
        ExprKind::Binary { op: BinOp::LAnd, .. } => false,
        _ => !matches!((&simplified.kind, &original_cond.kind), (ExprKind::Var(a), ExprKind::Var(b)) if a == b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, ProvenanceMap};
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    #[test]
    fn s4_nested_cond_prop() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(2000);

        let a = builder.create_var("a", Type::Bool);
        let b = builder.create_var("b", Type::Bool);
        let a_and_b = builder.create_land(a.clone(), b.clone());
        let s = builder.create_expr_stmt(builder.create_call("s", Type::Void, vec![]));
        let inner_if = builder.create_if(a_and_b, s, None);
        let mut outer_if = builder.create_if(a, inner_if, None);

        let mut pass = NestedCondProp;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        pass.run(&mut outer_if, &mut c);

        if let StmtKind::If { then_branch, .. } = &outer_if.kind {
            if let StmtKind::If { cond, .. } = &then_branch.kind {
                assert!(matches!(&cond.kind, delinear_ast::ExprKind::Var(name) if name == "b"));
            } else {
                panic!("expected nested if to survive");
            }
        } else {
            panic!("expected outer if to survive");
        }
    }
}
