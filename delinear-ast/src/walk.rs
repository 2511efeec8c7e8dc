//! A single traversal routine over the statement/expression tree.
//!
//! Pattern-matching on node kind in one place keeps adding a new pass a
//! matter of supplying a closure, rather than adding a method to a
//! double-dispatch visitor trait implemented once per pass.

use crate::expr::{Expr, ExprKind};
use crate::stmt::{Stmt, StmtKind};

/// Calls `f` on every expression reachable from `stmt`, including nested
/// subexpressions, in a pre-order walk.
pub fn for_each_expr(stmt: &Stmt, f: &mut impl FnMut(&Expr)) {
    match &stmt.kind {
        StmtKind::Decl { init, .. } => {
            if let Some(e) = init {
                for_each_expr_in(e, f);
            }
        }
        StmtKind::Compound(stmts) => stmts.iter().for_each(|s| for_each_expr(s, f)),
        StmtKind::If { cond, then_branch, else_branch } => {
            for_each_expr_in(cond, f);
            for_each_expr(then_branch, f);
            if let Some(e) = else_branch {
                for_each_expr(e, f);
            }
        }
        StmtKind::While { cond, body } => {
            for_each_expr_in(cond, f);
            for_each_expr(body, f);
        }
        StmtKind::DoWhile { body, cond } => {
            for_each_expr(body, f);
            for_each_expr_in(cond, f);
        }
        StmtKind::Return(value) => {
            if let Some(e) = value {
                for_each_expr_in(e, f);
            }
        }
        StmtKind::ExprStmt(e) => for_each_expr_in(e, f),
        StmtKind::Break | StmtKind::Null => {}
    }
}

fn for_each_expr_in(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::BoolLit(_) | ExprKind::Var(_) => {}
        ExprKind::Unary { operand, .. } => for_each_expr_in(operand, f),
        ExprKind::Binary { lhs, rhs, .. } => {
            for_each_expr_in(lhs, f);
            for_each_expr_in(rhs, f);
        }
        ExprKind::Cast { expr, .. } | ExprKind::Paren(expr) => for_each_expr_in(expr, f),
        ExprKind::Call { args, .. } => args.iter().for_each(|a| for_each_expr_in(a, f)),
        ExprKind::Member { base, .. } => for_each_expr_in(base, f),
        ExprKind::Index { base, index } => {
            for_each_expr_in(base, f);
            for_each_expr_in(index, f);
        }
        ExprKind::Assign { lhs, rhs } => {
            for_each_expr_in(lhs, f);
            for_each_expr_in(rhs, f);
        }
    }
}

/// Calls `f` on every statement reachable from `stmt` (including `stmt`
/// itself), in a pre-order walk. Does not descend into nested loop bodies'
/// surrounding `if`s differently from anything else -- callers that care
/// about loop nesting use [`crate::stmt::Stmt::contains_own_break`] instead.
pub fn for_each_stmt(stmt: &Stmt, f: &mut impl FnMut(&Stmt)) {
    f(stmt);
    match &stmt.kind {
        StmtKind::Compound(stmts) => stmts.iter().for_each(|s| for_each_stmt(s, f)),
        StmtKind::If { then_branch, else_branch, .. } => {
            for_each_stmt(then_branch, f);
            if let Some(e) = else_branch {
                for_each_stmt(e, f);
            }
        }
        StmtKind::While { body, .. } => for_each_stmt(body, f),
        StmtKind::DoWhile { body, .. } => for_each_stmt(body, f),
        StmtKind::Decl { .. }
        | StmtKind::Break
        | StmtKind::Return(_)
        | StmtKind::ExprStmt(_)
        | StmtKind::Null => {}
    }
}
