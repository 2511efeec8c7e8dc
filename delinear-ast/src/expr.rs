//! Expression nodes.
//!
//! Every node carries a [`NodeId`] so the provenance map can key off it
//! without a parent back-pointer. Construction always goes through
//! [`crate::builder::AstBuilder`]: no pass constructs nodes ad hoc.

use crate::node_id::NodeId;
use delinear_ir::Type;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    BitNot,
    /// Logical `!`.
    LNot,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    ShrS,
    ShrU,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Logical `&&`.
    LAnd,
    /// Logical `||`.
    LOr,
}

impl BinOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::LAnd | BinOp::LOr)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// The operator such that `a op b` is false exactly when `a self b` is
    /// true. Only defined for comparisons and logical connectives; used by
    /// statement-combination's `!(a == b) -> a != b` peephole and by the
    /// condition simplifier when it needs a syntactic (not just semantic)
    /// negation.
    pub fn negate_comparison(self) -> Option<BinOp> {
        Some(match self {
            BinOp::Eq => BinOp::Ne,
            BinOp::Ne => BinOp::Eq,
            BinOp::Lt => BinOp::Ge,
            BinOp::Ge => BinOp::Lt,
            BinOp::Gt => BinOp::Le,
            BinOp::Le => BinOp::Gt,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    /// A reference to a named variable (an SSA value or a materialized
    /// φ-selector).
    Var(String),
    Unary { op: UnOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Cast { to: Type, expr: Box<Expr> },
    Call { callee: String, args: Vec<Expr> },
    Member { base: Box<Expr>, field: String },
    Index { base: Box<Expr>, index: Box<Expr> },
    Paren(Box<Expr>),
    Assign { lhs: Box<Expr>, rhs: Box<Expr> },
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub ty: Type,
    pub kind: ExprKind,
}

impl Expr {
    pub fn is_true_literal(&self) -> bool {
        matches!(self.kind, ExprKind::BoolLit(true))
    }

    pub fn is_false_literal(&self) -> bool {
        matches!(self.kind, ExprKind::BoolLit(false))
    }
}
