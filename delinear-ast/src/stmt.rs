//! Statement nodes.

use crate::expr::Expr;
use crate::node_id::NodeId;
use delinear_ir::Type;

#[derive(Clone, Debug)]
pub enum StmtKind {
    Decl { name: String, ty: Type, init: Option<Expr> },
    Compound(Vec<Stmt>),
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Expr },
    Break,
    Return(Option<Expr>),
    ExprStmt(Expr),
    /// The empty statement `;`, left behind by rewrites that delete a
    /// statement's content but must preserve its slot pending a later
    /// scope-combination pass.
    Null,
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn is_null(&self) -> bool {
        matches!(self.kind, StmtKind::Null)
    }

    /// Treats an empty `Compound([])` the same as `Null`, since both are
    /// semantically no-ops that dead-statement elimination and nested-scope
    /// combination need to collapse identically.
    pub fn is_effectively_empty(&self) -> bool {
        match &self.kind {
            StmtKind::Null => true,
            StmtKind::Compound(stmts) => stmts.iter().all(Stmt::is_effectively_empty),
            _ => false,
        }
    }

    /// Whether `break` appears anywhere inside this statement without being
    /// shadowed by a nested loop (a `break` inside a nested `while`/`do`
    /// belongs to that inner loop, not the one `self` sits in). Loop
    /// refinement rules use this to classify which arm of an `if` exits the
    /// enclosing loop.
    pub fn contains_own_break(&self) -> bool {
        fn walk(stmt: &Stmt, out: &mut u32) {
            match &stmt.kind {
                StmtKind::Break => *out += 1,
                StmtKind::Compound(stmts) => stmts.iter().for_each(|s| walk(s, out)),
                StmtKind::If { then_branch, else_branch, .. } => {
                    walk(then_branch, out);
                    if let Some(e) = else_branch {
                        walk(e, out);
                    }
                }
                // A break inside a nested loop terminates that loop, not an
                // outer one; don't descend into While/DoWhile bodies.
                StmtKind::While { .. }
                | StmtKind::DoWhile { .. }
                | StmtKind::Decl { .. }
                | StmtKind::Return(_)
                | StmtKind::ExprStmt(_)
                | StmtKind::Null => {}
            }
        }
        let mut count = 0;
        walk(self, &mut count);
        count > 0
    }

    /// Number of `break` statements belonging to the innermost enclosing
    /// loop, found anywhere within `self`. Loop rules require then/else arms
    /// each containing at most one `break`.
    pub fn own_break_count(&self) -> u32 {
        fn walk(stmt: &Stmt, out: &mut u32) {
            match &stmt.kind {
                StmtKind::Break => *out += 1,
                StmtKind::Compound(stmts) => stmts.iter().for_each(|s| walk(s, out)),
                StmtKind::If { then_branch, else_branch, .. } => {
                    walk(then_branch, out);
                    if let Some(e) = else_branch {
                        walk(e, out);
                    }
                }
                StmtKind::While { .. }
                | StmtKind::DoWhile { .. }
                | StmtKind::Decl { .. }
                | StmtKind::Return(_)
                | StmtKind::ExprStmt(_)
                | StmtKind::Null => {}
            }
        }
        let mut count = 0;
        walk(self, &mut count);
        count
    }
}
