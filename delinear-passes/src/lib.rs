//! The AST refinement passes (C7) and the Pass Manager that drives them to
//! a fixpoint (C8).

pub mod cond_based_refine;
pub mod condition_simplify;
pub mod dead_stmt;
pub mod error;
pub mod loop_refine;
pub mod manager;
pub mod nested_cond_prop;
pub mod nested_scope_comb;
pub mod pass;
pub mod stmt_combine;

pub use cond_based_refine::CondBasedRefine;
pub use condition_simplify::ConditionSimplify;
pub use dead_stmt::DeadStmtElim;
pub use error::RefineError;
pub use loop_refine::LoopRefine;
pub use manager::{PassManager, ITERATION_CAP};
pub use nested_cond_prop::NestedCondProp;
pub use nested_scope_comb::NestedScopeComb;
pub use pass::{Pass, PassContext};
pub use stmt_combine::StmtCombine;
