//! The SMT bridge (C5): lowers AST boolean expressions to Z3 formulas and
//! lifts simplified formulas back, reusing original subexpressions where
//! structurally possible so provenance never has to be invented out of
//! thin air for an unchanged subterm.

use rustc_hash::FxHashMap;
use z3::ast::{Ast, Bool, Dynamic, BV};
use z3::Context;

use delinear_ast::{AstBuilder, BinOp, Expr, ExprKind, NodeId, ProvenanceMap, UnOp};
use delinear_ir::Type;

use crate::error::SmtError;

/// Per-function-run bridge state. Not shared between the two configured
/// simplifier instances (§3 "SMT contexts are owned per simplifier
/// instance"): each [`crate::simplifier::ConditionSimplifier`] owns one.
pub struct Z3ConvVisitor<'ctx> {
    ctx: &'ctx Context,
    /// One SMT constant per distinct variable name, so repeated reads of
    /// the same IR value always lower to the same Z3 constant.
    consts: FxHashMap<String, Dynamic<'ctx>>,
    /// Forward cache, keyed by AST node id: avoids re-lowering a subtree
    /// visited more than once in the same expression.
    forward: FxHashMap<NodeId, Bool<'ctx>>,
    /// Reverse cache, keyed by a formula's canonical string form: lets
    /// [`Self::lift`] hand back the *original* `Expr` (and therefore its
    /// existing provenance) instead of synthesizing a fresh node whenever
    /// the simplified formula is structurally unchanged.
    reverse: FxHashMap<String, Expr>,
}

impl<'ctx> Z3ConvVisitor<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self { ctx, consts: FxHashMap::default(), forward: FxHashMap::default(), reverse: FxHashMap::default() }
    }

    /// AST -> SMT for a boolean-typed expression (every guard and every
    /// refinement-pass condition is boolean; this is the bridge's only
    /// public entry point in that direction).
    pub fn lower(&mut self, expr: &Expr) -> Result<Bool<'ctx>, SmtError> {
        if expr.ty != Type::Bool {
            return Err(SmtError::UnsupportedExpr(format!("non-boolean top-level expr of type {}", expr.ty)));
        }
        self.lower_bool(expr)
    }

    fn lower_bool(&mut self, expr: &Expr) -> Result<Bool<'ctx>, SmtError> {
        if let Some(cached) = self.forward.get(&expr.id) {
            return Ok(cached.clone());
        }
        let z3_expr = match &expr.kind {
            ExprKind::BoolLit(b) => Bool::from_bool(self.ctx, *b),
            ExprKind::Var(name) => self.bool_const(name),
            ExprKind::Paren(inner) => self.lower_bool(inner)?,
            ExprKind::Unary { op: UnOp::LNot, operand } => self.lower_bool(operand)?.not(),
            ExprKind::Binary { op, lhs, rhs } if op.is_logical() => {
                let l = self.lower_bool(lhs)?;
                let r = self.lower_bool(rhs)?;
                match op {
                    BinOp::LAnd => Bool::and(self.ctx, &[&l, &r]),
                    BinOp::LOr => Bool::or(self.ctx, &[&l, &r]),
                    _ => unreachable!("is_logical() guarantees LAnd/LOr"),
                }
            }
            ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => self.lower_comparison(*op, lhs, rhs)?,
            other => return Err(SmtError::UnsupportedExpr(format!("{other:?} is not a boolean connective"))),
        };
        self.forward.insert(expr.id, z3_expr.clone());
        self.reverse.insert(z3_expr.to_string(), expr.clone());
        Ok(z3_expr)
    }

    fn lower_comparison(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Bool<'ctx>, SmtError> {
        let l = self.lower_bv(lhs)?;
        let r = self.lower_bv(rhs)?;
        Ok(match op {
            BinOp::Eq => l._eq(&r),
            BinOp::Ne => l._eq(&r).not(),
            BinOp::Lt => l.bvslt(&r),
            BinOp::Le => l.bvsle(&r),
            BinOp::Gt => l.bvsgt(&r),
            BinOp::Ge => l.bvsge(&r),
            _ => return Err(SmtError::UnsupportedExpr(format!("{op:?} is not a comparison"))),
        })
    }

    /// Lowers an arithmetic/bitwise subexpression to the theory of
    /// fixed-width bit-vectors.
    fn lower_bv(&mut self, expr: &Expr) -> Result<BV<'ctx>, SmtError> {
        let width = expr.ty.bit_width().unwrap_or(32);
        match &expr.kind {
            ExprKind::IntLit(v) => Ok(BV::from_i64(self.ctx, *v, width)),
            ExprKind::Var(name) => Ok(self.bv_const(name, width)),
            ExprKind::Paren(inner) => self.lower_bv(inner),
            ExprKind::Cast { expr, .. } => {
                let inner = self.lower_bv(expr)?;
                Ok(resize(inner, width))
            }
            ExprKind::Unary { op: UnOp::Neg, operand } => Ok(self.lower_bv(operand)?.bvneg()),
            ExprKind::Unary { op: UnOp::BitNot, operand } => Ok(self.lower_bv(operand)?.bvnot()),
            ExprKind::Binary { op, lhs, rhs } if !op.is_logical() && !op.is_comparison() => {
                let l = self.lower_bv(lhs)?;
                let r = self.lower_bv(rhs)?;
                Ok(match op {
                    BinOp::Add => l.bvadd(&r),
                    BinOp::Sub => l.bvsub(&r),
                    BinOp::Mul => l.bvmul(&r),
                    BinOp::SDiv => l.bvsdiv(&r),
                    BinOp::UDiv => l.bvudiv(&r),
                    BinOp::SRem => l.bvsrem(&r),
                    BinOp::URem => l.bvurem(&r),
                    BinOp::BitAnd => l.bvand(&r),
                    BinOp::BitOr => l.bvor(&r),
                    BinOp::BitXor => l.bvxor(&r),
                    BinOp::Shl => l.bvshl(&r),
                    BinOp::ShrS => l.bvashr(&r),
                    BinOp::ShrU => l.bvlshr(&r),
                    _ => unreachable!("filtered above"),
                })
            }
            other => Err(SmtError::UnsupportedExpr(format!("{other:?} has no bit-vector lowering"))),
        }
    }

    fn bool_const(&mut self, name: &str) -> Bool<'ctx> {
        if let Some(c) = self.consts.get(name) {
            return c.as_bool().expect("variable reused with mismatched sort");
        }
        let c = Bool::new_const(self.ctx, name);
        self.consts.insert(name.to_string(), Dynamic::from_ast(&c));
        c
    }

    fn bv_const(&mut self, name: &str, width: u32) -> BV<'ctx> {
        if let Some(c) = self.consts.get(name) {
            return c.as_bv().expect("variable reused with mismatched sort");
        }
        let c = BV::new_const(self.ctx, name, width);
        self.consts.insert(name.to_string(), Dynamic::from_ast(&c));
        c
    }

    /// SMT -> AST. Reuses the original `Expr` (and its provenance) for any
    /// subformula that appears verbatim in [`Self::reverse`]; only
    /// synthesizes fresh nodes -- via `builder`, registering fresh
    /// provenance copied from the nearest matching atom -- for genuinely
    /// new subterms the tactic pipeline produced.
    pub fn lift(&self, formula: &Bool<'ctx>, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Expr {
        if let Some(original) = self.reverse.get(&formula.to_string()) {
            return original.clone();
        }
        if let Some(value) = formula.as_bool() {
            return builder.create_bool_lit(value);
        }
        let decl_name = formula.decl().name();
        let children = formula.children();
        match decl_name.as_str() {
            "not" if children.len() == 1 => {
                let inner = children[0].as_bool().expect("not() applied to non-bool child");
                let operand = self.lift(&inner, builder, prov);
                let negated = builder.create_lnot(operand);
                if let Some(src) = self.reverse.get(&inner.to_string()) {
                    prov.copy_provenance(src.id, negated.id);
                }
                negated
            }
            "and" | "or" if !children.is_empty() => {
                let mut iter = children.iter().map(|c| {
                    let b = c.as_bool().expect("and/or child is not boolean");
                    self.lift(&b, builder, prov)
                });
                let first = iter.next().expect("non-empty children");
                iter.fold(first, |acc, next| {
                    if decl_name == "and" {
                        builder.create_land(acc, next)
                    } else {
                        builder.create_lor(acc, next)
                    }
                })
            }
            "true" => builder.create_bool_lit(true),
            "false" => builder.create_bool_lit(false),
            _ => {
                // A genuinely new atom (e.g. a tactic-introduced equality
                // with no surviving original subterm). No IR entity backs
                // it, so it gets no provenance entry; callers that require
                // totality (Testable Property 1) only ever hand this back
                // through `Simplify`, whose equivalence contract means it
                // replaces something that already had one, but we cannot
                // invent a source here without guessing.
                tracing::warn!(formula = %formula, "lift: synthesizing unprovenanced atom");
                builder.create_var(formula.to_string(), Type::Bool)
            }
        }
    }
}

fn resize(bv: BV<'_>, width: u32) -> BV<'_> {
    let cur = bv.get_size();
    match cur.cmp(&width) {
        std::cmp::Ordering::Less => bv.sign_ext(width - cur),
        std::cmp::Ordering::Greater => bv.extract(width - 1, 0),
        std::cmp::Ordering::Equal => bv,
    }
}
