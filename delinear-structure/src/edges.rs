//! Per-edge guard computation, shared between [`crate::reaching_conditions`]
//! (which only needs the boolean guard) and [`crate::structuralizer`]
//! (which also needs the φ-selector args carried on that edge).
//!
//! §4.4 step 2: `edge_guard` is the terminator's guard (or its negation for
//! the false edge, or `true` for unconditional). §4.4 edge cases: switch
//! edges lower to equality comparisons against the scrutinee; the default
//! edge's guard is the conjunction of every case's negated comparison.

use delinear_ast::{AstBuilder, Expr, ProvenanceMap};
use delinear_ir::{Block, Terminator, Value};

use crate::expr_visitor::ExprVisitor;

/// One outgoing edge of a block's terminator: the target, the condition
/// under which it is taken, the φ-selector args carried across it, and
/// whether that condition was synthesized from a `switch` scrutinee
/// comparison (§9 open question (c): excluded from condition-based
/// refinement's disjoint-cover merging).
pub struct Edge {
    pub target: Block,
    pub guard: Expr,
    pub args: Vec<Value>,
    pub switch_synthesized: bool,
}

/// Every outgoing edge of `term`, each with its guard expression.
pub fn outgoing_edges(
    term: &Terminator,
    visitor: &mut ExprVisitor<'_>,
    builder: &AstBuilder,
    prov: &mut ProvenanceMap,
) -> Vec<Edge> {
    match term {
        Terminator::Jump { target, args } => {
            vec![Edge { target: *target, guard: builder.create_bool_lit(true), args: args.clone(), switch_synthesized: false }]
        }
        Terminator::Branch { guard, then_block, then_args, else_block, else_args } => {
            let then_guard = visitor.guard_expr(*guard, false, prov);
            let else_guard = visitor.guard_expr(*guard, true, prov);
            vec![
                Edge { target: *then_block, guard: then_guard, args: then_args.clone(), switch_synthesized: false },
                Edge { target: *else_block, guard: else_guard, args: else_args.clone(), switch_synthesized: false },
            ]
        }
        Terminator::Switch { scrutinee, cases, default } => {
            // `guard_expr(.., negate: false, ..)` is just "materialize this
            // value", reused here rather than adding a second public entry
            // point to `ExprVisitor` for the same operation.
            let scrutinee_expr = visitor.guard_expr(*scrutinee, false, prov);
            let mut edges = Vec::with_capacity(cases.len() + 1);
            let mut all_negated: Option<Expr> = None;
            for case in cases {
                let lit = builder.create_int_lit(scrutinee_expr.ty, case.value);
                let eq = builder.create_comparison(delinear_ast::BinOp::Eq, scrutinee_expr.clone(), lit.clone());
                prov.set(eq.id, *scrutinee);
                prov.mark_switch_synthesized(eq.id);
                let negated = builder.create_lnot(eq.clone());
                prov.copy_provenance(eq.id, negated.id);
                prov.mark_switch_synthesized(negated.id);
                all_negated = Some(match all_negated {
                    None => negated,
                    Some(acc) => {
                        let conj = builder.create_land(acc, negated);
                        prov.mark_switch_synthesized(conj.id);
                        conj
                    }
                });
                edges.push(Edge { target: case.target, guard: eq, args: vec![], switch_synthesized: true });
            }
            let default_guard = all_negated.unwrap_or_else(|| builder.create_bool_lit(true));
            edges.push(Edge { target: *default, guard: default_guard, args: vec![], switch_synthesized: true });
            edges
        }
        Terminator::Return(_) | Terminator::Unreachable => vec![],
    }
}
