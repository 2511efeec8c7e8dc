//! The `Pass` trait and the context threaded through every pass
//! invocation.
//!
//! §9 Design Notes: "a single traversal routine with pattern matching on
//! node kind is sufficient; passes supply per-kind handlers" -- rather than
//! a double-dispatch visitor, each pass owns its own (small) recursive
//! traversal over `&mut Stmt` and reports whether it changed anything.

use delinear_ast::{AstBuilder, ProvenanceMap, Stmt};
use delinear_smt::ConditionSimplifier;

/// State shared by every pass in a phase. Passes never construct their own
/// [`AstBuilder`]/[`ProvenanceMap`]/[`ConditionSimplifier`]; all three are
/// owned by [`crate::manager::PassManager`] for the duration of one
/// function's refinement.
pub struct PassContext<'a> {
    pub builder: &'a AstBuilder,
    pub prov: &'a mut ProvenanceMap,
    pub simplifier: &'a mut ConditionSimplifier,
    pub function_name: &'a str,
}

/// A single AST-to-AST rewrite. `run` mutates `body` in place and returns
/// whether it changed anything; [`crate::manager::PassManager`] iterates a
/// phase's passes to a fixpoint by repeating until every pass in the phase
/// reports `false` in the same round.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool;
}
