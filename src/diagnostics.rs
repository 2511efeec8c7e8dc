//! The per-function diagnostic log (SPEC_FULL §11.2): retained on success,
//! not just when a function is skipped for an `UnsupportedConstruct`.
//!
//! Records the loop shapes C7/C8 settled on (a loop that never left
//! `while (true) { .. break .. }` is one no loop-refinement rule matched)
//! and whether re-running the pass manager over its own output changes
//! anything -- `Stmt`/`Expr` carry no `PartialEq`, so the check compares
//! printed text, analogous to Cranelift's `timing` module recording which
//! passes actually ran.

use delinear_ast::{walk, AstBuilder, ProvenanceMap, Stmt, StmtKind};
use delinear_passes::{PassManager, RefineError};

use crate::printer::print_stmt_standalone;

#[derive(Debug)]
pub struct FunctionDiagnostic {
    pub function: String,
    /// One entry per loop left in the final AST, in traversal order:
    /// `"while(true)"` if C7's loop-refinement rules never matched it,
    /// `"while"` / `"do-while"` otherwise.
    pub loop_shapes: Vec<&'static str>,
    /// Testable Property 4: re-running the final phase over already-refined
    /// output must be a no-op.
    pub idempotent: bool,
}

pub fn diagnose(
    function_name: &str,
    refined: &Stmt,
    manager: &PassManager,
    builder: &AstBuilder,
    prov: &mut ProvenanceMap,
) -> Result<FunctionDiagnostic, RefineError> {
    let loop_shapes = collect_loop_shapes(refined);
    let idempotent = check_idempotence(function_name, refined, manager, builder, prov)?;
    Ok(FunctionDiagnostic { function: function_name.to_string(), loop_shapes, idempotent })
}

fn collect_loop_shapes(stmt: &Stmt) -> Vec<&'static str> {
    let mut shapes = Vec::new();
    walk::for_each_stmt(stmt, &mut |s| match &s.kind {
        StmtKind::While { cond, .. } if cond.is_true_literal() => shapes.push("while(true)"),
        StmtKind::While { .. } => shapes.push("while"),
        StmtKind::DoWhile { .. } => shapes.push("do-while"),
        _ => {}
    });
    shapes
}

fn check_idempotence(
    function_name: &str,
    refined: &Stmt,
    manager: &PassManager,
    builder: &AstBuilder,
    prov: &mut ProvenanceMap,
) -> Result<bool, RefineError> {
    let before = print_stmt_standalone(refined);
    let rerun = manager.run(refined.clone(), builder, prov, function_name)?;
    let after = print_stmt_standalone(&rerun);
    Ok(before == after)
}
