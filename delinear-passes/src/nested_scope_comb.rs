//! Nested-scope combination.
//!
//! `{ { S1; S2 } S3 }` -> `{ S1; S2; S3 }`. `if (A) S` immediately
//! followed by `if (A) T` (A equivalent under C6) -> `if (A) { S; T }`.

use delinear_ast::{Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct NestedScopeComb;

impl Pass for NestedScopeComb {
    fn name(&self) -> &'static str {
        "nested-scope-comb"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        combine(body, ctx)
    }
}

fn combine(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= combine(s, ctx);
            }
            changed |= flatten_nested_compounds(stmts, ctx);
            changed |= merge_adjacent_ifs(stmts, ctx);
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            changed |= combine(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= combine(e, ctx);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= combine(body, ctx);
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

fn flatten_nested_compounds(stmts: &mut Vec<Stmt>, ctx: &mut PassContext) -> bool {
    let had_nested = stmts.iter().any(|s| matches!(s.kind, StmtKind::Compound(_)));
    if !had_nested {
        return false;
    }
    let mut out = Vec::with_capacity(stmts.len());
    for s in stmts.drain(..) {
        match s.kind {
            StmtKind::Compound(inner) => {
                ctx.prov.forget(s.id);
                out.extend(inner);
            }
            _ => out.push(s),
        }
    }
    *stmts = out;
    true
}

fn merge_adjacent_ifs(stmts: &mut Vec<Stmt>, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < stmts.len() {
        let mergeable = match (&stmts[i].kind, &stmts[i + 1].kind) {
            (
                StmtKind::If { cond: a, else_branch: None, .. },
                StmtKind::If { cond: b, else_branch: None, .. },
            ) => same_guard(a, b) || ctx.simplifier.prove_equivalent(a, b, ctx.builder).is_valid(),
            _ => false,
        };
        if mergeable {
            let second = stmts.remove(i + 1);
            let (cond2, then2) = match second.kind {
                StmtKind::If { cond, then_branch, .. } => (cond, then_branch),
                _ => unreachable!(),
            };
            ctx.prov.forget(second.id);
            ctx.prov.forget(cond2.id);
            if let StmtKind::If { then_branch, .. } = &mut stmts[i].kind {
                let merged = ctx.builder.create_compound_stmt(vec![(**then_branch).clone(), *then2]);
                *then_branch = Box::new(merged);
            }
            changed = true;
            continue;
        }
        i += 1;
    }
    changed
}

fn same_guard(a: &delinear_ast::Expr, b: &delinear_ast::Expr) -> bool {
    delinear_smt::structural_key(a) == delinear_smt::structural_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::AstBuilder;
    use delinear_ast::ProvenanceMap;
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    #[test]
    fn flattens_nested_compound() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);
        let s1 = builder.create_expr_stmt(builder.create_call("s1", Type::Void, vec![]));
        let s2 = builder.create_expr_stmt(builder.create_call("s2", Type::Void, vec![]));
        let s3 = builder.create_expr_stmt(builder.create_call("s3", Type::Void, vec![]));
        let inner = builder.create_compound_stmt(vec![s1, s2]);
        let mut outer = builder.create_compound_stmt(vec![inner, s3]);

        let mut pass = NestedScopeComb;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut outer, &mut c));
        match outer.kind {
            StmtKind::Compound(stmts) => assert_eq!(stmts.len(), 3),
            other => panic!("expected flattened 3-stmt compound, got {other:?}"),
        }
    }

    #[test]
    fn merges_adjacent_same_guard_ifs() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);
        let a1 = builder.create_var("a", Type::Bool);
        let a2 = builder.create_var("a", Type::Bool);
        let s1 = builder.create_expr_stmt(builder.create_call("s1", Type::Void, vec![]));
        let s2 = builder.create_expr_stmt(builder.create_call("s2", Type::Void, vec![]));
        let if1 = builder.create_if(a1, s1, None);
        let if2 = builder.create_if(a2, s2, None);
        let mut outer = builder.create_compound_stmt(vec![if1, if2]);

        let mut pass = NestedScopeComb;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut outer, &mut c));
        match outer.kind {
            StmtKind::Compound(stmts) => {
                assert_eq!(stmts.len(), 1);
                if let StmtKind::If { then_branch, .. } = &stmts[0].kind {
                    assert!(matches!(then_branch.kind, StmtKind::Compound(ref v) if v.len() == 2));
                } else {
                    panic!("expected merged if");
                }
            }
            other => panic!("expected single merged if, got {other:?}"),
        }
    }
}
