//! Dead-statement elimination.
//!
//! `if (false) T else E -> E`; `if (true) T else E -> T`; empty compounds
//! nested inside a compound collapse away; variable declarations with no
//! reads anywhere else in the function and a side-effect-free initializer
//! are dropped.

use rustc_hash::FxHashSet;

use delinear_ast::walk::{for_each_expr, for_each_stmt};
use delinear_ast::{Expr, ExprKind, Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct DeadStmtElim;

impl Pass for DeadStmtElim {
    fn name(&self) -> &'static str {
        "dead-stmt-elim"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        let mut changed = false;
        changed |= fold_constant_ifs(body, ctx);
        changed |= collapse_empty_children(body, ctx);
        changed |= remove_unused_decls(body, ctx);
        changed
    }
}

/// `if (false) T else E -> E`, `if (true) T else E -> T`. Recurses into
/// every reachable statement, including loop bodies.
fn fold_constant_ifs(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::If { cond, then_branch, else_branch } => {
            if cond.is_true_literal() {
                let replacement = std::mem::replace(then_branch.as_mut(), ctx.builder.create_null());
                if let Some(e) = else_branch.take() {
                    forget_subtree(&e, ctx);
                }
                forget_node(cond, ctx);
                *stmt = replacement;
                return true;
            }
            if cond.is_false_literal() {
                let replacement = match else_branch.take() {
                    Some(e) => *e,
                    None => ctx.builder.create_null(),
                };
                forget_subtree(then_branch, ctx);
                forget_node(cond, ctx);
                *stmt = replacement;
                return true;
            }
            changed |= fold_constant_ifs(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= fold_constant_ifs(e, ctx);
            }
        }
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= fold_constant_ifs(s, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= fold_constant_ifs(body, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

/// Collapses `{ {} S }` / `{ S {} }` by dropping compound children (and
/// bare `Null`s masquerading as them) that are effectively empty.
fn collapse_empty_children(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Compound(stmts) => {
            let before = stmts.len();
            for s in stmts.iter_mut() {
                changed |= collapse_empty_children(s, ctx);
            }
            stmts.retain(|s| {
                let keep = !matches!(s.kind, StmtKind::Compound(ref inner) if inner.is_empty());
                if !keep {
                    ctx.prov.forget(s.id);
                }
                keep
            });
            changed |= stmts.len() != before;
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            changed |= collapse_empty_children(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= collapse_empty_children(e, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= collapse_empty_children(body, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

fn remove_unused_decls(body: &mut Stmt, ctx: &mut PassContext) -> bool {
    // `for_each_expr` already descends into a `Decl`'s initializer, so one
    // walk over every statement's expressions (including decl inits)
    // collects every read in the function.
    let mut used: FxHashSet<String> = FxHashSet::default();
    for_each_stmt(body, &mut |s| for_each_expr(s, &mut |e| collect_var(e, &mut used)));

    prune_unused(body, &used, ctx)
}

fn collect_var(expr: &Expr, used: &mut FxHashSet<String>) {
    if let ExprKind::Var(name) = &expr.kind {
        used.insert(name.clone());
    }
}

fn prune_unused(stmt: &mut Stmt, used: &FxHashSet<String>, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Compound(stmts) => {
            let before = stmts.len();
            stmts.retain(|s| {
                if let StmtKind::Decl { name, init, .. } = &s.kind {
                    let side_effecting = init.as_ref().is_some_and(contains_call);
                    if !used.contains(name) && !side_effecting {
                        forget_subtree(s, ctx);
                        return false;
                    }
                }
                true
            });
            changed |= stmts.len() != before;
            for s in stmts.iter_mut() {
                changed |= prune_unused(s, used, ctx);
            }
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            changed |= prune_unused(then_branch, used, ctx);
            if let Some(e) = else_branch {
                changed |= prune_unused(e, used, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= prune_unused(body, used, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

fn contains_call(expr: &Expr) -> bool {
    let mut found = false;
    for_each_expr(&stmt_wrapping(expr), &mut |e| {
        if matches!(e.kind, ExprKind::Call { .. }) {
            found = true;
        }
    });
    found
}

/// [`for_each_expr`] walks from a `Stmt`; wrap a bare `Expr` in a throwaway
/// `ExprStmt` so the same traversal can be reused for initializer
/// subtrees without a parallel `Expr`-rooted walker.
fn stmt_wrapping(expr: &Expr) -> Stmt {
    Stmt { id: expr.id, kind: StmtKind::ExprStmt(expr.clone()) }
}

fn forget_node(expr: &Expr, ctx: &mut PassContext) {
    for_each_expr(&stmt_wrapping(expr), &mut |e| ctx.prov.forget(e.id));
}

fn forget_subtree(stmt: &Stmt, ctx: &mut PassContext) {
    for_each_stmt(stmt, &mut |s| {
        ctx.prov.forget(s.id);
        for_each_expr(s, &mut |e| ctx.prov.forget(e.id));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, ProvenanceMap};
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    fn ctx<'a>(builder: &'a AstBuilder, prov: &'a mut ProvenanceMap, simplifier: &'a mut ConditionSimplifier) -> PassContext<'a> {
        PassContext { builder, prov, simplifier, function_name: "t" }
    }

    #[test]
    fn s6_false_branch_survives() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let s1 = builder.create_expr_stmt(builder.create_call("s1", Type::Void, vec![]));
        let s2 = builder.create_expr_stmt(builder.create_call("s2", Type::Void, vec![]));
        let mut stmt = builder.create_if(builder.create_bool_lit(false), s1, Some(s2.clone()));

        let mut pass = DeadStmtElim;
        let mut c = ctx(&builder, &mut prov, &mut simp);
        assert!(pass.run(&mut stmt, &mut c));
        match stmt.kind {
            StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::Call { ref callee, .. } if callee == "s2")),
            other => panic!("expected s2 to survive, got {other:?}"),
        }
        let _ = s2;
    }

    #[test]
    fn unused_pure_decl_is_dropped() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let decl = builder.create_decl("v0", Type::I32, Some(builder.create_int_lit(Type::I32, 1)));
        let mut stmt = builder.create_compound_stmt(vec![decl]);

        let mut pass = DeadStmtElim;
        let mut c = ctx(&builder, &mut prov, &mut simp);
        assert!(pass.run(&mut stmt, &mut c));
        match stmt.kind {
            StmtKind::Compound(stmts) => assert!(stmts.is_empty()),
            other => panic!("expected empty compound, got {other:?}"),
        }
    }

    #[test]
    fn unused_call_decl_is_kept() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let call = builder.create_call("side_effect", Type::I32, vec![]);
        let decl = builder.create_decl("v0", Type::I32, Some(call));
        let mut stmt = builder.create_compound_stmt(vec![decl]);

        let mut pass = DeadStmtElim;
        let mut c = ctx(&builder, &mut prov, &mut simp);
        pass.run(&mut stmt, &mut c);
        match stmt.kind {
            StmtKind::Compound(stmts) => assert_eq!(stmts.len(), 1),
            other => panic!("expected call decl to survive, got {other:?}"),
        }
    }
}
