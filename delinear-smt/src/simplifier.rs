//! The condition simplifier (C6): runs a configured SMT tactic pipeline
//! over a guard to canonicalize or minimize it, and proves tautologies for
//! the condition-based-refinement pass's guard-negation check.
//!
//! Two instances exist per function run, each owning an independent
//! [`Context`] and cache (§3): one for the CBR fixpoint
//! (`aig ∧ simplify`), one for the Final phase
//! (`aig ∧ propagate-bv-bounds ∧ tseitin-cnf ∧ ctx-simplify`).

use std::time::Duration;

use rustc_hash::FxHashMap;
use z3::{Config, Context, Goal, Params, SatResult, Solver, Tactic};

use delinear_ast::{AstBuilder, Expr, ProvenanceMap};

use crate::bridge::Z3ConvVisitor;
use crate::error::SmtError;
use crate::structural_key;

/// §8 Testable Property 2's three-valued `Prove` result. `Unknown` is
/// folded to `Invalid` by every caller per §4.6 ("callers treat unknown as
/// invalid"); it is kept distinct here so that fold is visible at the call
/// site rather than hidden inside the bridge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ProveResult {
    Valid,
    Invalid,
    Unknown,
}

impl ProveResult {
    /// The conservative, non-rewriting interpretation §4.6 mandates.
    pub fn is_valid(self) -> bool {
        matches!(self, ProveResult::Valid)
    }
}

pub const DEFAULT_TACTICS_CBR: &str = "aig;simplify";
pub const DEFAULT_TACTICS_FINAL: &str = "aig;propagate-bv-bounds;tseitin-cnf;ctx-simplify";

pub struct ConditionSimplifier {
    ctx: Context,
    tactics: String,
    timeout_ms: u32,
    /// Structural-hash cache (§4.6): identical boolean subexpressions,
    /// modulo `&&`/`||` commutativity, yield the same result within this
    /// simplifier's lifetime. Invalidated only by the simplifier's own
    /// destruction, never explicitly cleared.
    cache: FxHashMap<u64, Expr>,
}

impl ConditionSimplifier {
    pub fn new(tactics: impl Into<String>, timeout_ms: u32) -> Self {
        let mut cfg = Config::new();
        cfg.set_timeout_msec(timeout_ms as u64);
        Self { ctx: Context::new(&cfg), tactics: tactics.into(), timeout_ms, cache: FxHashMap::default() }
    }

    pub fn for_condition_based_refinement(timeout_ms: u32) -> Self {
        Self::new(DEFAULT_TACTICS_CBR, timeout_ms)
    }

    pub fn for_final_phase(timeout_ms: u32) -> Self {
        Self::new(DEFAULT_TACTICS_FINAL, timeout_ms)
    }

    fn tactic_pipeline(&self) -> Tactic<'_> {
        let mut names = self.tactics.split(';').filter(|s| !s.is_empty());
        let first = names.next().unwrap_or("simplify");
        let mut pipeline = Tactic::new(&self.ctx, first);
        for name in names {
            pipeline = pipeline.and_then(&Tactic::new(&self.ctx, name));
        }
        pipeline
    }

    /// `Simplify(expr) -> expr'` such that `expr <-> expr'` is valid under
    /// the configured theories (§8 Testable Property 2). On any SMT failure
    /// (timeout, unknown, solver crash) returns `expr` unchanged -- callers
    /// never see a raw [`SmtError`] for the recoverable cases, per §7's
    /// propagation policy for kind 5.
    pub fn simplify(&mut self, expr: &Expr, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Expr {
        let key = structural_key(expr);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let simplified = self.try_simplify(expr, builder, prov).unwrap_or_else(|err| {
            tracing::debug!(%err, "simplify: falling back to original expression");
            expr.clone()
        });
        self.cache.insert(key, simplified.clone());
        simplified
    }

    fn try_simplify(&self, expr: &Expr, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Result<Expr, SmtError> {
        let mut conv = Z3ConvVisitor::new(&self.ctx);
        let formula = conv.lower(expr)?;

        let goal = Goal::new(&self.ctx, false, false, false);
        goal.assert(&formula);
        let result = self
            .tactic_pipeline()
            .apply(&goal, None)
            .map_err(|e| SmtError::SolverUnavailable(e.to_string()))?;

        let subgoals = result.list_subgoals();
        let clauses: Vec<_> = subgoals.iter().flat_map(|g| g.get_formulas::<z3::ast::Bool>()).collect();
        if clauses.is_empty() {
            return Ok(builder.create_bool_lit(true));
        }
        let simplified_formula = if clauses.len() == 1 {
            clauses.into_iter().next().unwrap()
        } else {
            z3::ast::Bool::and(&self.ctx, &clauses.iter().collect::<Vec<_>>())
        };
        Ok(conv.lift(&simplified_formula, builder, prov))
    }

    /// `Prove(expr)`: attempts to show `expr` is a tautology by checking
    /// satisfiability of its negation. `Unsat` on the negation means `expr`
    /// is valid; `Sat` means it has a counterexample; `Unknown` covers both
    /// genuine solver uncertainty and a timeout (§5: "timeout -> treat as
    /// unknown").
    pub fn prove(&self, expr: &Expr) -> ProveResult {
        match self.try_prove(expr) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(%err, "prove: treating as unknown");
                ProveResult::Unknown
            }
        }
    }

    fn try_prove(&self, expr: &Expr) -> Result<ProveResult, SmtError> {
        let mut conv = Z3ConvVisitor::new(&self.ctx);
        let formula = conv.lower(expr)?;

        let solver = Solver::new(&self.ctx);
        let mut params = Params::new(&self.ctx);
        params.set_u32("timeout", self.timeout_ms);
        solver.set_params(&params);
        solver.assert(&formula.not());

        Ok(match solver.check() {
            SatResult::Unsat => ProveResult::Valid,
            SatResult::Sat => ProveResult::Invalid,
            SatResult::Unknown => ProveResult::Unknown,
        })
    }

    /// `Prove(a <-> b)`: whether two guards are provably equivalent.
    /// Condition-based refinement uses this to test `C2 <-> !C1` without
    /// the caller having to build the negation itself.
    pub fn prove_equivalent(&self, a: &Expr, b: &Expr, builder: &AstBuilder) -> ProveResult {
        let iff = builder.create_land(
            builder.create_lor(builder.create_lnot(a.clone()), b.clone()),
            builder.create_lor(a.clone(), builder.create_lnot(b.clone())),
        );
        self.prove(&iff)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms as u64)
    }
}

/// §8 Testable Property 2 as a `proptest` fuzz check: for boolean
/// expressions drawn from a small generator of variables, int comparisons,
/// and `!`/`&&`/`||`, `Simplify(e)` is always provably equivalent to `e`.
#[cfg(test)]
mod equivalence_proptest {
    use proptest::prelude::*;

    use delinear_ast::{AstBuilder, BinOp, Expr};
    use delinear_ir::Type;

    use super::ConditionSimplifier;

    /// A tiny boolean-expression grammar, kept separate from [`Expr`] so
    /// the recursive `proptest` strategy can derive `Arbitrary`-style
    /// shrinking without the AST's node-id bookkeeping getting in the way;
    /// [`to_expr`] lowers one into real builder-constructed nodes.
    #[derive(Clone, Debug)]
    enum BoolTerm {
        Cmp(BinOp, u8, i64),
        Not(Box<BoolTerm>),
        And(Box<BoolTerm>, Box<BoolTerm>),
        Or(Box<BoolTerm>, Box<BoolTerm>),
    }

    fn cmp_op() -> impl Strategy<Value = BinOp> {
        prop_oneof![
            Just(BinOp::Eq),
            Just(BinOp::Ne),
            Just(BinOp::Lt),
            Just(BinOp::Le),
            Just(BinOp::Gt),
            Just(BinOp::Ge),
        ]
    }

    /// Three variable names (`v0`..`v2`) and small literals keep the
    /// generated formulas tiny so Z3 resolves every case well inside the
    /// per-call timeout.
    fn bool_term() -> impl Strategy<Value = BoolTerm> {
        let leaf = (cmp_op(), 0u8..3, -4i64..4).prop_map(|(op, var, lit)| BoolTerm::Cmp(op, var, lit));
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(|t| BoolTerm::Not(Box::new(t))),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| BoolTerm::And(Box::new(l), Box::new(r))),
                (inner.clone(), inner).prop_map(|(l, r)| BoolTerm::Or(Box::new(l), Box::new(r))),
            ]
        })
    }

    fn to_expr(term: &BoolTerm, builder: &AstBuilder) -> Expr {
        match term {
            BoolTerm::Cmp(op, var, lit) => {
                let lhs = builder.create_var(format!("v{var}"), Type::I32);
                let rhs = builder.create_int_lit(Type::I32, *lit);
                builder.create_comparison(*op, lhs, rhs)
            }
            BoolTerm::Not(t) => builder.create_lnot(to_expr(t, builder)),
            BoolTerm::And(l, r) => builder.create_land(to_expr(l, builder), to_expr(r, builder)),
            BoolTerm::Or(l, r) => builder.create_lor(to_expr(l, builder), to_expr(r, builder)),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn simplify_preserves_equivalence(term in bool_term()) {
            let builder = AstBuilder::new();
            let mut prov = delinear_ast::ProvenanceMap::new();
            let mut simp = ConditionSimplifier::for_condition_based_refinement(2000);

            let expr = to_expr(&term, &builder);
            let simplified = simp.simplify(&expr, &builder, &mut prov);

            let equiv = simp.prove_equivalent(&expr, &simplified, &builder);
            prop_assert!(equiv.is_valid() || equiv == super::ProveResult::Unknown);
        }
    }
}
