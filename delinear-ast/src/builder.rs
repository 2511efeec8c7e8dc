//! The AST builder: a narrow factory that is the *only* way to construct
//! AST nodes. Centralizing construction here means every node gets a
//! fresh [`NodeId`] and, where the output language's type rules demand it,
//! an inserted cast -- so passes never need to reconstruct that logic.

use delinear_ir::Type;

use crate::expr::{BinOp, Expr, ExprKind, UnOp};
use crate::node_id::{NodeId, NodeIdGen};
use crate::stmt::{Stmt, StmtKind};

pub struct AstBuilder {
    ids: NodeIdGen,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self { ids: NodeIdGen::new() }
    }

    fn expr(&self, ty: Type, kind: ExprKind) -> Expr {
        Expr { id: self.ids.fresh(), ty, kind }
    }

    fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt { id: self.ids.fresh(), kind }
    }

    pub fn create_int_lit(&self, ty: Type, value: i64) -> Expr {
        self.expr(ty, ExprKind::IntLit(value))
    }

    pub fn create_float_lit(&self, ty: Type, value: f64) -> Expr {
        self.expr(ty, ExprKind::FloatLit(value))
    }

    pub fn create_bool_lit(&self, value: bool) -> Expr {
        self.expr(Type::Bool, ExprKind::BoolLit(value))
    }

    pub fn create_var(&self, name: impl Into<String>, ty: Type) -> Expr {
        self.expr(ty, ExprKind::Var(name.into()))
    }

    /// Logical negation. Always produces a `Type::Bool` expression;
    /// `operand` must already be boolean-typed (comparisons and `&&`/`||`
    /// always are in this IR, so no implicit cast is ever needed here).
    pub fn create_lnot(&self, operand: Expr) -> Expr {
        debug_assert_eq!(operand.ty, Type::Bool, "CreateLNot requires a boolean operand");
        self.expr(Type::Bool, ExprKind::Unary { op: UnOp::LNot, operand: Box::new(operand) })
    }

    pub fn create_unary(&self, op: UnOp, ty: Type, operand: Expr) -> Expr {
        self.expr(ty, ExprKind::Unary { op, operand: Box::new(operand) })
    }

    pub fn create_land(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.create_logical_binop(BinOp::LAnd, lhs, rhs)
    }

    pub fn create_lor(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.create_logical_binop(BinOp::LOr, lhs, rhs)
    }

    fn create_logical_binop(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        debug_assert_eq!(lhs.ty, Type::Bool);
        debug_assert_eq!(rhs.ty, Type::Bool);
        self.expr(Type::Bool, ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    pub fn create_binary(&self, op: BinOp, ty: Type, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ty, ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    pub fn create_comparison(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        debug_assert!(op.is_comparison());
        self.expr(Type::Bool, ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    /// Inserts a cast only if `expr`'s type differs from `to`, so callers
    /// never need to check first.
    pub fn create_cast(&self, to: Type, expr: Expr) -> Expr {
        if expr.ty == to {
            return expr;
        }
        self.expr(to, ExprKind::Cast { to, expr: Box::new(expr) })
    }

    pub fn create_call(&self, callee: impl Into<String>, ty: Type, args: Vec<Expr>) -> Expr {
        self.expr(ty, ExprKind::Call { callee: callee.into(), args })
    }

    pub fn create_member(&self, ty: Type, base: Expr, field: impl Into<String>) -> Expr {
        self.expr(ty, ExprKind::Member { base: Box::new(base), field: field.into() })
    }

    pub fn create_index(&self, ty: Type, base: Expr, index: Expr) -> Expr {
        self.expr(ty, ExprKind::Index { base: Box::new(base), index: Box::new(index) })
    }

    pub fn create_paren(&self, expr: Expr) -> Expr {
        let ty = expr.ty;
        self.expr(ty, ExprKind::Paren(Box::new(expr)))
    }

    pub fn create_assign(&self, lhs: Expr, rhs: Expr) -> Expr {
        let ty = lhs.ty;
        let rhs = self.create_cast(ty, rhs);
        self.expr(ty, ExprKind::Assign { lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    pub fn create_decl(&self, name: impl Into<String>, ty: Type, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Decl { name: name.into(), ty, init })
    }

    pub fn create_compound_stmt(&self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Compound(stmts))
    }

    pub fn create_if(&self, cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        debug_assert_eq!(cond.ty, Type::Bool, "CreateIf requires a boolean condition");
        self.stmt(StmtKind::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn create_while(&self, cond: Expr, body: Stmt) -> Stmt {
        debug_assert_eq!(cond.ty, Type::Bool);
        self.stmt(StmtKind::While { cond, body: Box::new(body) })
    }

    pub fn create_do(&self, body: Stmt, cond: Expr) -> Stmt {
        debug_assert_eq!(cond.ty, Type::Bool);
        self.stmt(StmtKind::DoWhile { body: Box::new(body), cond })
    }

    pub fn create_break(&self) -> Stmt {
        self.stmt(StmtKind::Break)
    }

    pub fn create_return(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn create_expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::ExprStmt(expr))
    }

    pub fn create_null(&self) -> Stmt {
        self.stmt(StmtKind::Null)
    }

    /// Exposed so passes that allocate their own temporaries (e.g. the
    /// structuralizer's φ-selector variables) get ids from the same
    /// generator as everything else, keeping ids globally unique.
    pub fn fresh_id(&self) -> NodeId {
        self.ids.fresh()
    }
}
