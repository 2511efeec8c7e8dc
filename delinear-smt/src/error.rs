//! Error kinds owned by the SMT bridge: §7 error kind 4 (`SMTError`), plus
//! the conversion failures that can only happen if a caller feeds the
//! bridge an expression shape it doesn't translate.
//!
//! §7's kind 5 (`SMTUnknown`/`Timeout`) is deliberately *not* a variant
//! here: those are recovered locally by [`crate::simplifier::ConditionSimplifier`]
//! and never surface as an `Err` to its callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmtError {
    #[error("z3 solver unavailable or crashed: {0}")]
    SolverUnavailable(String),

    #[error("cannot lower expression to SMT: {0}")]
    UnsupportedExpr(String),
}
