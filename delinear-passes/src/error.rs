//! Error kinds owned by the refinement pipeline: §7 kind 3
//! (`InvariantViolation`) and kind 6 (`WriteError`'s sibling for this
//! crate, the pass-manager iteration cap). Both are fatal; neither is ever
//! swallowed the way `SMTUnknown`/`Timeout` are.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("invariant violated in `{function}`: {detail}")]
    InvariantViolation { function: String, detail: String },

    #[error(
        "pass manager exceeded the {limit}-iteration cap on phase `{phase}` for `{function}`; \
         this indicates a non-terminating rewrite, not an input problem"
    )]
    IterationCapExceeded { function: String, phase: &'static str, limit: u32 },
}
