//! Statement combination: the final phase's peephole cleanup.
//!
//! `!(!x) -> x`; `!(a == b) -> a != b`; `if (C) {} else E -> if (!C) E`;
//! single-statement compounds collapse to their one statement; constant
//! arithmetic/logical subexpressions fold.

use delinear_ast::{AstBuilder, BinOp, Expr, ExprKind, ProvenanceMap, Stmt, StmtKind, UnOp};

use crate::pass::{Pass, PassContext};

pub struct StmtCombine;

impl Pass for StmtCombine {
    fn name(&self) -> &'static str {
        "stmt-combine"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        combine_stmt(body, ctx.builder, ctx.prov)
    }
}

fn combine_stmt(stmt: &mut Stmt, builder: &AstBuilder, prov: &mut ProvenanceMap) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::If { cond, then_branch, else_branch } => {
            changed |= combine_expr(cond, builder, prov);
            changed |= combine_stmt(then_branch, builder, prov);
            if let Some(e) = else_branch {
                changed |= combine_stmt(e, builder, prov);
            }
            if then_branch.is_effectively_empty() {
                if let Some(e) = else_branch.take() {
                    let negated = builder.create_lnot(cond.clone());
                    prov.copy_provenance(cond.id, negated.id);
                    *stmt = builder.create_if(negated, *e, None);
                    return true;
                }
            }
        }
        StmtKind::While { cond, body } => {
            changed |= combine_expr(cond, builder, prov);
            changed |= combine_stmt(body, builder, prov);
        }
        StmtKind::DoWhile { body, cond } => {
            changed |= combine_stmt(body, builder, prov);
            changed |= combine_expr(cond, builder, prov);
        }
        StmtKind::Decl { init: Some(init), .. } => changed |= combine_expr(init, builder, prov),
        StmtKind::ExprStmt(e) => changed |= combine_expr(e, builder, prov),
        StmtKind::Return(Some(e)) => changed |= combine_expr(e, builder, prov),
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= combine_stmt(s, builder, prov);
            }
            if stmts.len() == 1 {
                *stmt = stmts.pop().expect("len == 1");
                return true;
            }
        }
        StmtKind::Decl { init: None, .. } | StmtKind::Break | StmtKind::Return(None) | StmtKind::Null => {}
    }
    changed
}

fn combine_expr(expr: &mut Expr, builder: &AstBuilder, prov: &mut ProvenanceMap) -> bool {
    let mut changed = false;
    match &mut expr.kind {
        ExprKind::Unary { operand, .. } => changed |= combine_expr(operand, builder, prov),
        ExprKind::Binary { lhs, rhs, .. } => {
            changed |= combine_expr(lhs, builder, prov);
            changed |= combine_expr(rhs, builder, prov);
        }
        ExprKind::Cast { expr: inner, .. } | ExprKind::Paren(inner) => changed |= combine_expr(inner, builder, prov),
        ExprKind::Call { args, .. } => {
            for a in args.iter_mut() {
                changed |= combine_expr(a, builder, prov);
            }
        }
        ExprKind::Member { base, .. } => changed |= combine_expr(base, builder, prov),
        ExprKind::Index { base, index } => {
            changed |= combine_expr(base, builder, prov);
            changed |= combine_expr(index, builder, prov);
        }
        ExprKind::Assign { lhs, rhs } => {
            changed |= combine_expr(lhs, builder, prov);
            changed |= combine_expr(rhs, builder, prov);
        }
        ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::BoolLit(_) | ExprKind::Var(_) => {}
    }
    if let Some(rewritten) = peephole(expr, builder, prov) {
        prov.copy_provenance(expr.id, rewritten.id);
        *expr = rewritten;
        changed = true;
    }
    if let Some(folded) = constant_fold(expr, builder) {
        prov.copy_provenance(expr.id, folded.id);
        *expr = folded;
        changed = true;
    }
    changed
}

fn peephole(expr: &Expr, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Expr> {
    match &expr.kind {
        // !(!x) -> x
        ExprKind::Unary { op: UnOp::LNot, operand } => match &operand.kind {
            ExprKind::Unary { op: UnOp::LNot, operand: inner } => {
                prov.copy_provenance(operand.id, inner.id);
                Some((**inner).clone())
            }
            // !(a == b) -> a != b, and so on for every comparison with a
            // syntactic negation.
            ExprKind::Binary { op, lhs, rhs } => {
                let negated_op = op.negate_comparison()?;
                Some(builder.create_comparison(negated_op, (**lhs).clone(), (**rhs).clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

fn constant_fold(expr: &Expr, builder: &AstBuilder) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Unary { op: UnOp::LNot, operand } => match operand.kind {
            ExprKind::BoolLit(b) => Some(builder.create_bool_lit(!b)),
            _ => None,
        },
        ExprKind::Binary { op, lhs, rhs } if op.is_logical() => match (&lhs.kind, &rhs.kind) {
            (ExprKind::BoolLit(l), ExprKind::BoolLit(r)) => {
                let v = if *op == BinOp::LAnd { *l && *r } else { *l || *r };
                Some(builder.create_bool_lit(v))
            }
            (ExprKind::BoolLit(true), _) if *op == BinOp::LAnd => Some((**rhs).clone()),
            (ExprKind::BoolLit(false), _) if *op == BinOp::LOr => Some((**rhs).clone()),
            (_, ExprKind::BoolLit(true)) if *op == BinOp::LAnd => Some((**lhs).clone()),
            (_, ExprKind::BoolLit(false)) if *op == BinOp::LOr => Some((**lhs).clone()),
            (ExprKind::BoolLit(false), _) if *op == BinOp::LAnd => Some(builder.create_bool_lit(false)),
            (ExprKind::BoolLit(true), _) if *op == BinOp::LOr => Some(builder.create_bool_lit(true)),
            _ => None,
        },
        ExprKind::Binary { op, lhs, rhs } if !op.is_comparison() && !op.is_logical() => match (&lhs.kind, &rhs.kind) {
            (ExprKind::IntLit(l), ExprKind::IntLit(r)) => fold_int_binop(*op, *l, *r).map(|v| builder.create_int_lit(expr.ty, v)),
            _ => None,
        },
        ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => match (&lhs.kind, &rhs.kind) {
            (ExprKind::IntLit(l), ExprKind::IntLit(r)) => Some(builder.create_bool_lit(fold_cmp(*op, *l, *r))),
            _ => None,
        },
        _ => None,
    }
}

fn fold_int_binop(op: BinOp, l: i64, r: i64) -> Option<i64> {
    Some(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::SDiv if r != 0 => l.wrapping_div(r),
        BinOp::SRem if r != 0 => l.wrapping_rem(r),
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        BinOp::BitXor => l ^ r,
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::ShrS => l.wrapping_shr(r as u32),
        _ => return None,
    })
}

fn fold_cmp(op: BinOp, l: i64, r: i64) -> bool {
    match op {
        BinOp::Eq => l == r,
        BinOp::Ne => l != r,
        BinOp::Lt => l < r,
        BinOp::Le => l <= r,
        BinOp::Gt => l > r,
        BinOp::Ge => l >= r,
        _ => unreachable!("is_comparison() guarantees one of the above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::ProvenanceMap;
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    #[test]
    fn double_negation_cancels() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_final_phase(1000);
        let x = builder.create_var("x", Type::Bool);
        let not_not_x = builder.create_lnot(builder.create_lnot(x));
        let mut stmt = builder.create_expr_stmt(not_not_x);

        let mut pass = StmtCombine;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut stmt, &mut c));
        match stmt.kind {
            StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::Var(ref n) if n == "x")),
            other => panic!("expected bare var, got {other:?}"),
        }
    }

    #[test]
    fn negated_eq_becomes_ne() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_final_phase(1000);
        let a = builder.create_var("a", Type::I32);
        let b = builder.create_var("b", Type::I32);
        let eq = builder.create_comparison(BinOp::Eq, a, b);
        let not_eq = builder.create_lnot(eq);
        let mut stmt = builder.create_expr_stmt(not_eq);

        let mut pass = StmtCombine;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut stmt, &mut c));
        match stmt.kind {
            StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::Binary { op: BinOp::Ne, .. })),
            other => panic!("expected !=, got {other:?}"),
        }
    }

    #[test]
    fn single_stmt_compound_collapses() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_final_phase(1000);
        let inner = builder.create_expr_stmt(builder.create_call("f", Type::Void, vec![]));
        let mut stmt = builder.create_compound_stmt(vec![inner]);

        let mut pass = StmtCombine;
        let mut c = PassContext { builder: &builder, prov: &mut prov, simplifier: &mut simp, function_name: "t" };
        assert!(pass.run(&mut stmt, &mut c));
        assert!(matches!(stmt.kind, StmtKind::ExprStmt(_)));
    }
}
