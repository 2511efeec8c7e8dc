//! Structural hashing of boolean AST expressions, modulo commutativity of
//! `&&`/`||`.
//!
//! [`crate::simplifier::ConditionSimplifier`] uses this as the cache key
//! for `Simplify`: two syntactically different but structurally identical
//! guards (e.g. `a && b` and `b && a`) must hit the same cache entry within
//! a pass, per §4.6's caching requirement.

use delinear_ast::{BinOp, Expr, ExprKind, UnOp};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

pub fn structural_key(expr: &Expr) -> u64 {
    let mut hasher = FxHasher::default();
    hash_expr(expr, &mut hasher);
    hasher.finish()
}

fn hash_expr(expr: &Expr, hasher: &mut FxHasher) {
    expr.ty.hash(hasher);
    match &expr.kind {
        ExprKind::IntLit(v) => {
            0u8.hash(hasher);
            v.hash(hasher);
        }
        ExprKind::FloatLit(v) => {
            1u8.hash(hasher);
            v.to_bits().hash(hasher);
        }
        ExprKind::BoolLit(v) => {
            2u8.hash(hasher);
            v.hash(hasher);
        }
        ExprKind::Var(name) => {
            3u8.hash(hasher);
            name.hash(hasher);
        }
        ExprKind::Unary { op, operand } => {
            4u8.hash(hasher);
            hash_unop(*op, hasher);
            hash_expr(operand, hasher);
        }
        ExprKind::Binary { op, lhs, rhs } if op.is_logical() => {
            // Commutative: combine children's hashes with a symmetric
            // operator (wrapping add) so operand order doesn't matter.
            5u8.hash(hasher);
            hash_binop(*op, hasher);
            let lh = sub_hash(lhs);
            let rh = sub_hash(rhs);
            lh.wrapping_add(rh).hash(hasher);
        }
        ExprKind::Binary { op, lhs, rhs } => {
            6u8.hash(hasher);
            hash_binop(*op, hasher);
            hash_expr(lhs, hasher);
            hash_expr(rhs, hasher);
        }
        ExprKind::Cast { to, expr } => {
            7u8.hash(hasher);
            to.hash(hasher);
            hash_expr(expr, hasher);
        }
        ExprKind::Call { callee, args } => {
            8u8.hash(hasher);
            callee.hash(hasher);
            for a in args {
                hash_expr(a, hasher);
            }
        }
        ExprKind::Member { base, field } => {
            9u8.hash(hasher);
            hash_expr(base, hasher);
            field.hash(hasher);
        }
        ExprKind::Index { base, index } => {
            10u8.hash(hasher);
            hash_expr(base, hasher);
            hash_expr(index, hasher);
        }
        ExprKind::Paren(inner) => hash_expr(inner, hasher),
        ExprKind::Assign { lhs, rhs } => {
            11u8.hash(hasher);
            hash_expr(lhs, hasher);
            hash_expr(rhs, hasher);
        }
    }
}

fn sub_hash(expr: &Expr) -> u64 {
    let mut h = FxHasher::default();
    hash_expr(expr, &mut h);
    h.finish()
}

fn hash_unop(op: UnOp, hasher: &mut FxHasher) {
    (op as u8 as u64 + 100).hash(hasher);
}

fn hash_binop(op: BinOp, hasher: &mut FxHasher) {
    (op as u8 as u64 + 200).hash(hasher);
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::AstBuilder;
    use delinear_ir::Type;

    #[test]
    fn land_is_commutative() {
        let b = AstBuilder::new();
        let a = b.create_var("a", Type::Bool);
        let c = b.create_var("c", Type::Bool);
        let ac = b.create_land(a.clone(), c.clone());
        let ca = b.create_land(c, a);
        assert_eq!(structural_key(&ac), structural_key(&ca));
    }

    #[test]
    fn comparison_is_not_commutative() {
        let b = AstBuilder::new();
        let x = b.create_var("x", Type::I32);
        let y = b.create_var("y", Type::I32);
        let lt = b.create_comparison(BinOp::Lt, x.clone(), y.clone());
        let gt = b.create_comparison(BinOp::Lt, y, x);
        assert_ne!(structural_key(&lt), structural_key(&gt));
    }
}
