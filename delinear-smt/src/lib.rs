//! The SMT bridge (C5) and condition simplifier (C6).
//!
//! Consumes the `z3` crate as a black-box boolean tactic pipeline per
//! §1: this crate never parses or emits SMT-LIB text, only builds formulas
//! through `z3-rs`'s typed AST API.

pub mod bridge;
pub mod error;
pub mod simplifier;
mod structural_hash;

pub use bridge::Z3ConvVisitor;
pub use error::SmtError;
pub use simplifier::{ConditionSimplifier, ProveResult, DEFAULT_TACTICS_CBR, DEFAULT_TACTICS_FINAL};
pub use structural_hash::structural_key;
