//! The Pass Manager (C8): drives the four §4.8 phases over one function's
//! AST.
//!
//! ```text
//! 1. Structuralize (C4, run by the caller) + DeadStmtElim
//! 2. CBR fixpoint:   {condition-simplifier(cbr), nested-cond-prop, nested-scope-comb, cond-based-refine}
//! 3. Loop fixpoint:  {loop-refine, nested-scope-comb}
//! 4. Final phase:    {condition-simplifier(final), nested-cond-prop, nested-scope-comb, stmt-combine}, run once
//! ```
//!
//! Fixpoint phases repeat until a full round makes no change, capped at
//! [`ITERATION_CAP`] rounds (SPEC_FULL §11.4) -- exceeding it means a
//! non-terminating rewrite, reported as [`RefineError::IterationCapExceeded`]
//! rather than looped on forever.

use delinear_ast::{AstBuilder, ProvenanceMap, Stmt};
use delinear_smt::{ConditionSimplifier, DEFAULT_TACTICS_CBR, DEFAULT_TACTICS_FINAL};

use crate::cond_based_refine::CondBasedRefine;
use crate::condition_simplify::ConditionSimplify;
use crate::dead_stmt::DeadStmtElim;
use crate::error::RefineError;
use crate::loop_refine::LoopRefine;
use crate::nested_cond_prop::NestedCondProp;
use crate::nested_scope_comb::NestedScopeComb;
use crate::pass::{Pass, PassContext};
use crate::stmt_combine::StmtCombine;

/// The hard per-phase fixpoint bound (SPEC_FULL §11.4).
pub const ITERATION_CAP: u32 = 256;

pub struct PassManager {
    smt_timeout_ms: u32,
    tactics_cbr: String,
    tactics_final: String,
}

impl PassManager {
    pub fn new(smt_timeout_ms: u32) -> Self {
        Self { smt_timeout_ms, tactics_cbr: DEFAULT_TACTICS_CBR.to_string(), tactics_final: DEFAULT_TACTICS_FINAL.to_string() }
    }

    /// Overrides the two tactic pipelines (the CLI's `--smt-tactics-cbr`
    /// and `--smt-tactics-final` flags), leaving the timeout as given.
    pub fn with_tactics(smt_timeout_ms: u32, tactics_cbr: impl Into<String>, tactics_final: impl Into<String>) -> Self {
        Self { smt_timeout_ms, tactics_cbr: tactics_cbr.into(), tactics_final: tactics_final.into() }
    }

    /// Refines `body` (the C4 structuralizer's output) in place and returns
    /// the final AST. `function_name` is only used for diagnostics.
    pub fn run(&self, mut body: Stmt, builder: &AstBuilder, prov: &mut ProvenanceMap, function_name: &str) -> Result<Stmt, RefineError> {
        tracing::debug!(function = function_name, "pass manager: phase 1 (dead-stmt-elim)");
        let mut cbr_simplifier = ConditionSimplifier::new(self.tactics_cbr.clone(), self.smt_timeout_ms);
        let mut phase1: Vec<Box<dyn Pass>> = vec![Box::new(DeadStmtElim)];
        self.run_once(&mut body, builder, prov, function_name, &mut cbr_simplifier, &mut phase1);

        tracing::debug!(function = function_name, "pass manager: phase 2 (cbr fixpoint)");
        let mut phase2: Vec<Box<dyn Pass>> =
            vec![Box::new(ConditionSimplify), Box::new(NestedCondProp), Box::new(NestedScopeComb), Box::new(CondBasedRefine)];
        self.run_fixpoint(&mut body, builder, prov, function_name, "cbr-fixpoint", &mut cbr_simplifier, &mut phase2)?;

        tracing::debug!(function = function_name, "pass manager: phase 3 (loop fixpoint)");
        let mut phase3: Vec<Box<dyn Pass>> = vec![Box::new(LoopRefine), Box::new(NestedScopeComb)];
        self.run_fixpoint(&mut body, builder, prov, function_name, "loop-fixpoint", &mut cbr_simplifier, &mut phase3)?;

        tracing::debug!(function = function_name, "pass manager: phase 4 (final)");
        let mut final_simplifier = ConditionSimplifier::new(self.tactics_final.clone(), self.smt_timeout_ms);
        let mut phase4: Vec<Box<dyn Pass>> =
            vec![Box::new(ConditionSimplify), Box::new(NestedCondProp), Box::new(NestedScopeComb), Box::new(StmtCombine)];
        self.run_once(&mut body, builder, prov, function_name, &mut final_simplifier, &mut phase4);

        Ok(body)
    }

    fn run_once(
        &self,
        body: &mut Stmt,
        builder: &AstBuilder,
        prov: &mut ProvenanceMap,
        function_name: &str,
        simplifier: &mut ConditionSimplifier,
        passes: &mut [Box<dyn Pass>],
    ) {
        let mut ctx = PassContext { builder, prov, simplifier, function_name };
        for pass in passes.iter_mut() {
            let changed = pass.run(body, &mut ctx);
            tracing::trace!(function = function_name, pass = pass.name(), changed, "pass manager: ran pass");
        }
    }

    fn run_fixpoint(
        &self,
        body: &mut Stmt,
        builder: &AstBuilder,
        prov: &mut ProvenanceMap,
        function_name: &str,
        phase: &'static str,
        simplifier: &mut ConditionSimplifier,
        passes: &mut [Box<dyn Pass>],
    ) -> Result<(), RefineError> {
        for iteration in 0..ITERATION_CAP {
            let mut ctx = PassContext { builder, prov, simplifier, function_name };
            let mut changed = false;
            for pass in passes.iter_mut() {
                let pass_changed = pass.run(body, &mut ctx);
                tracing::trace!(function = function_name, pass = pass.name(), iteration, changed = pass_changed, "pass manager: ran pass");
                changed |= pass_changed;
            }
            if !changed {
                return Ok(());
            }
        }
        Err(RefineError::IterationCapExceeded { function: function_name.to_string(), phase, limit: ITERATION_CAP })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ir::Type;

    #[test]
    fn dead_if_true_collapses_in_phase_one() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let manager = PassManager::new(2000);

        let call = builder.create_call("s", Type::Void, vec![]);
        let s = builder.create_expr_stmt(call);
        let body = builder.create_if(builder.create_bool_lit(true), s, None);
        let compound = builder.create_compound_stmt(vec![body]);

        let refined = manager.run(compound, &builder, &mut prov, "t").expect("refines cleanly");
        let mut has_if = false;
        delinear_ast::walk::for_each_stmt(&refined, &mut |s| {
            has_if |= matches!(s.kind, delinear_ast::StmtKind::If { .. });
        });
        assert!(!has_if, "if(true) should have been folded away by dead-stmt-elim");
    }
}
